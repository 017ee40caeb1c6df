//! Numeric primitives for extracting pulse features from a sampled trace.
//!
//! Every primitive is a pure function of a [Waveform] and a small `Copy`
//! configuration struct, so a call never depends on what was analysed
//! before it. A typical preamp analysis looks like:
//! ```text
//! let smoothed = bandpass::smooth(&raw, bandpass);           // rough extrema
//! let (offset, cropped) = raw.cropped_to_dyadic();
//! let mut decomposition = wavelet::decompose(&cropped, 6)?;  // denoise
//! wavelet::threshold(&mut decomposition, 0.8, Some(&table))?;
//! let denoised = wavelet::reconstruct(&decomposition);
//! let slope = savitzky_golay::differentiate(&pulse, derivative);
//! let regions = find_regions(slope.samples(), 0.5 * steepest);
//! let risetime = risetime::extract(&pulse, height, from, config)?;
//! ```

pub(crate) mod detectors;
pub(crate) mod extremum;
pub(crate) mod filters;
pub(crate) mod risetime;
pub(crate) mod waveform;
pub(crate) mod wavelet;
pub(crate) mod window;

pub(crate) use detectors::region_detector::find_regions;
pub(crate) use extremum::{Extremum, ExtremumKind, find_extremum};
pub(crate) use filters::{bandpass, savitzky_golay};
pub(crate) use waveform::Waveform;

pub(crate) use bege_common::Real;
