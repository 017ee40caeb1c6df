//! Stationary (undecimated) Haar wavelet transform and hard thresholding.
//!
//! At level `j` the approximation is split with a stride of `2^(j-1)`:
//! ```text
//! a_j[n] = (a_{j-1}[n] + a_{j-1}[n + s]) / √2
//! d_j[n] = (a_{j-1}[n] − a_{j-1}[n + s]) / √2
//! ```
//! with indices taken modulo the length, so every band has the same length
//! as the waveform. The inverse averages the two interleaved decimated
//! inverses at each level, which is exact when no coefficient is changed.
use super::{Real, Waveform};
use crate::error::FeatureError;
use itertools::izip;
use std::f64::consts::FRAC_1_SQRT_2;

/// Divides the median absolute deviation to estimate the standard deviation
/// of gaussian noise.
const MAD_TO_SIGMA: Real = 0.6745;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CoefficientPair {
    pub(crate) approximation: Vec<Real>,
    pub(crate) detail: Vec<Real>,
}

/// Coefficient bands of levels `1..=L`, finest first.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Decomposition {
    levels: Vec<CoefficientPair>,
    sampling_frequency: Real,
}

impl Decomposition {
    #[cfg(test)]
    pub(crate) fn levels(&self) -> &[CoefficientPair] {
        &self.levels
    }

    pub(crate) fn num_levels(&self) -> usize {
        self.levels.len()
    }
}

/// Threshold applied to one level's detail band, and how many
/// coefficients survived it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LevelThreshold {
    pub(crate) threshold: Real,
    pub(crate) retained: usize,
}

/// The waveform length must be a positive multiple of `2^levels`.
pub(crate) fn decompose(waveform: &Waveform, levels: usize) -> Result<Decomposition, FeatureError> {
    let length = waveform.len();
    let block = u32::try_from(levels)
        .ok()
        .and_then(|levels| 1_usize.checked_shl(levels));
    match block {
        Some(block) if levels > 0 && length > 0 && length % block == 0 => {}
        _ => return Err(FeatureError::InsufficientLength { length, levels }),
    }

    let mut bands = Vec::with_capacity(levels);
    let mut previous = waveform.samples().to_vec();
    for level in 0..levels {
        let step = 1 << level;
        let (approximation, detail): (Vec<Real>, Vec<Real>) = (0..length)
            .map(|n| {
                let (a, b) = (previous[n], previous[(n + step) % length]);
                ((a + b) * FRAC_1_SQRT_2, (a - b) * FRAC_1_SQRT_2)
            })
            .unzip();
        previous.clone_from(&approximation);
        bands.push(CoefficientPair {
            approximation,
            detail,
        });
    }
    Ok(Decomposition {
        levels: bands,
        sampling_frequency: waveform.sampling_frequency(),
    })
}

fn median(values: &[Real]) -> Real {
    let mut sorted = values.to_vec();
    sorted.sort_by(Real::total_cmp);
    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[mid],
        _ => 0.5 * (sorted[mid - 1] + sorted[mid]),
    }
}

/// `sqrt(2 ln N) · σ`, with σ the median absolute deviation of the band
/// over [MAD_TO_SIGMA].
pub(crate) fn universal_threshold(detail: &[Real]) -> Real {
    let centre = median(detail);
    let deviations: Vec<Real> = detail.iter().map(|d| (d - centre).abs()).collect();
    let sigma = median(&deviations) / MAD_TO_SIGMA;
    (2.0 * (detail.len().max(1) as Real).ln()).sqrt() * sigma
}

/// Zeroes every detail coefficient whose magnitude is below its level's
/// threshold, in place. The threshold of level `j` is
/// `scaler · fixed[j - 1]` when a table is given, otherwise
/// `scaler ·` [universal_threshold].
pub(crate) fn threshold(
    decomposition: &mut Decomposition,
    scaler: Real,
    fixed: Option<&[Real]>,
) -> Result<Vec<LevelThreshold>, FeatureError> {
    if let Some(table) = fixed {
        if table.len() != decomposition.num_levels() {
            return Err(FeatureError::DimensionMismatch {
                expected: decomposition.num_levels(),
                found: table.len(),
            });
        }
    }

    Ok(decomposition
        .levels
        .iter_mut()
        .enumerate()
        .map(|(level, pair)| {
            let threshold = scaler
                * fixed
                    .and_then(|table| table.get(level).copied())
                    .unwrap_or_else(|| universal_threshold(&pair.detail));
            pair.detail
                .iter_mut()
                .filter(|d| d.abs() < threshold)
                .for_each(|d| *d = 0.0);
            LevelThreshold {
                threshold,
                retained: pair.detail.iter().filter(|&&d| d != 0.0).count(),
            }
        })
        .collect())
}

/// Single level periodic Haar inverse of a decimated pair of bands.
fn inverse_haar<'a>(
    approximation: impl Iterator<Item = &'a Real>,
    detail: impl Iterator<Item = &'a Real>,
) -> Vec<Real> {
    approximation
        .zip(detail)
        .flat_map(|(a, d)| [(a + d) * FRAC_1_SQRT_2, (a - d) * FRAC_1_SQRT_2])
        .collect()
}

/// Rebuilds the waveform from the coarsest approximation and every detail
/// band, coarsest level first.
pub(crate) fn reconstruct(decomposition: &Decomposition) -> Waveform {
    let Some(coarsest) = decomposition.levels.last() else {
        return Waveform::new(Vec::new(), decomposition.sampling_frequency);
    };
    let length = coarsest.approximation.len();
    let mut output = coarsest.approximation.clone();

    // Scratch buffers reused by every phase of every level
    let mut approximation = Vec::with_capacity(length);
    let mut detail = Vec::with_capacity(length);

    for (level, pair) in decomposition.levels.iter().enumerate().rev() {
        let step = 1 << level;
        for first in 0..step {
            let indices = (first..length).step_by(step);
            approximation.clear();
            approximation.extend(indices.clone().map(|i| output[i]));
            detail.clear();
            detail.extend(indices.clone().map(|i| pair.detail[i]));

            let even = inverse_haar(approximation.iter().step_by(2), detail.iter().step_by(2));
            let mut odd = inverse_haar(
                approximation.iter().skip(1).step_by(2),
                detail.iter().skip(1).step_by(2),
            );
            odd.rotate_right(1);

            for (i, x1, x2) in izip!(indices, &even, &odd) {
                output[i] = 0.5 * (x1 + x2);
            }
        }
    }
    Waveform::new(output, decomposition.sampling_frequency)
}
