//! Centred FIR filters. Samples beyond either end of the waveform are
//! taken to equal the nearest end sample.
pub(crate) mod bandpass;
pub(crate) mod savitzky_golay;

use super::Real;

/// Computes `output[i] = Σ_k kernel[k] · input[i + k − half]` where the
/// kernel has odd length `2·half + 1`.
fn correlate_replicated(input: &[Real], kernel: &[Real]) -> Vec<Real> {
    let half = kernel.len() / 2;
    let last = input.len().saturating_sub(1);
    (0..input.len())
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, coefficient)| {
                    let j = (i + k).saturating_sub(half).min(last);
                    coefficient * input[j]
                })
                .sum()
        })
        .collect()
}
