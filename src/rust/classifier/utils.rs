use ndarray::Array1;

pub(crate) fn normalize_vector(values: &mut [f64]) {
    let norm: f64 = values.iter().map(|&x| x * x).sum::<f64>().sqrt();
    if norm > 1e-10 {
        values.iter_mut().for_each(|x| *x /= norm);
    } else {
        values.iter_mut().for_each(|x| *x = 0.0);
    }
}

/// Numerically stable softmax. The result is renormalized so it sums to 1
/// regardless of rounding in the exponentials.
pub(crate) fn softmax(scores: &Array1<f64>) -> Array1<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exp = scores.mapv(|s| (s - max).exp());
    let sum = exp.sum();
    if sum > 0.0 && sum.is_finite() {
        exp.mapv(|e| (e / sum).clamp(0.0, 1.0))
    } else {
        Array1::from_elem(scores.len(), 1.0 / scores.len() as f64)
    }
}

/// Index of the largest value; the first index wins exact ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = i;
        }
    }
    best
}
