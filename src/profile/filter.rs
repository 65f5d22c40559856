//! Order-statistic and convolution filters for denoising bucket series.
//!
//! The median pass knocks out isolated spikes, the Gaussian pass rounds the
//! remaining steps into a plottable curve. Both are deliberately lossy;
//! anything that must be mass-preserving happens before them.

/// Sliding-window median filter, window clipped at the array boundaries.
pub fn median_filter(values: &[f64], window: usize) -> Vec<f64> {
    if values.is_empty() || window <= 1 {
        return values.to_vec();
    }
    let half = window / 2;
    let len = values.len();
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(len);
        let mut slice: Vec<f64> = values[start..end].to_vec();
        slice.sort_by(f64::total_cmp);
        out.push(slice[slice.len() / 2]);
    }
    out
}

/// Discrete Gaussian convolution with normalized weights and zero padding
/// past the boundaries. Sigma is half the kernel size.
pub fn gaussian_smooth(values: &[f64], kernel: usize) -> Vec<f64> {
    if values.is_empty() || kernel <= 1 {
        return values.to_vec();
    }
    let half = (kernel / 2) as isize;
    let sigma = kernel as f64 / 2.0;
    let weights: Vec<f64> = (-half..=half)
        .map(|d| (-((d * d) as f64) / (2.0 * sigma * sigma)).exp())
        .collect();
    let norm: f64 = weights.iter().sum();

    let len = values.len() as isize;
    let mut out = Vec::with_capacity(values.len());
    for i in 0..len {
        let mut acc = 0.0;
        for (w, d) in weights.iter().zip(-half..=half) {
            let j = i + d;
            if j >= 0 && j < len {
                acc += w * values[j as usize];
            }
        }
        out.push(acc / norm);
    }
    out
}
