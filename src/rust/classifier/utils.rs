use ndarray::Array1;

pub(crate) fn sigmoid(z: f32) -> f32 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        // Keeps exp() from overflowing for large negative margins
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Number of whitespace-separated words, the unit the minimum-length rule counts.
pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub(crate) fn dense_from_entries(width: usize, entries: &[(usize, f32)]) -> Array1<f32> {
    let mut dense = Array1::zeros(width);
    for &(index, value) in entries {
        if index < width {
            dense[index] = value;
        }
    }
    dense
}
