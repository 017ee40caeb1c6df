//! Savitzky–Golay derivative: the slope at each sample of the least squares
//! polynomial fitted to the `2·half_width + 1` samples around it.
use super::{super::Waveform, Real, correlate_replicated};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DerivativeConfig {
    pub(crate) half_width: usize,
    pub(crate) poly_order: usize,
}

impl Default for DerivativeConfig {
    fn default() -> Self {
        Self {
            half_width: 6,
            poly_order: 2,
        }
    }
}

impl DerivativeConfig {
    fn window(&self) -> usize {
        2 * self.half_width.max(1) + 1
    }

    /// First derivative coefficients per sample, from the normal equations
    /// `(JᵀJ) a = Jᵀ y` where `J[i][k] = x_iᵏ`.
    pub(crate) fn coefficients(&self) -> Vec<Real> {
        let half = self.half_width.max(1) as Real;
        let terms = self.poly_order.clamp(1, self.window() - 1) + 1;
        let xs: Vec<Real> = (0..self.window()).map(|i| i as Real - half).collect();

        // Augmented matrix [JᵀJ | I]
        let mut augmented: Vec<Vec<Real>> = (0..terms)
            .map(|row| {
                (0..2 * terms)
                    .map(|col| {
                        if col < terms {
                            xs.iter().map(|x| x.powi((row + col) as i32)).sum()
                        } else if col - terms == row {
                            1.0
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        // Gauss-Jordan with partial pivoting
        for col in 0..terms {
            let pivot_row = (col..terms)
                .max_by(|&a, &b| augmented[a][col].abs().total_cmp(&augmented[b][col].abs()))
                .unwrap_or(col);
            augmented.swap(col, pivot_row);
            let pivot = augmented[col][col];
            augmented[col].iter_mut().for_each(|v| *v /= pivot);
            for row in 0..terms {
                if row != col {
                    let factor = augmented[row][col];
                    for k in 0..2 * terms {
                        augmented[row][k] -= factor * augmented[col][k];
                    }
                }
            }
        }

        // Row 1 of the inverse gives the linear term, which is the slope at x = 0
        let slope_row = &augmented[1][terms..];
        xs.iter()
            .map(|&x| {
                slope_row
                    .iter()
                    .enumerate()
                    .map(|(k, a)| a * x.powi(k as i32))
                    .sum()
            })
            .collect()
    }
}

/// Smoothed first derivative in volts per second.
pub(crate) fn differentiate(waveform: &Waveform, config: DerivativeConfig) -> Waveform {
    let per_second: Vec<Real> = config
        .coefficients()
        .into_iter()
        .map(|c| c * waveform.sampling_frequency())
        .collect();
    waveform.with_samples(correlate_replicated(waveform.samples(), &per_second))
}
