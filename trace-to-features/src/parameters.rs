use crate::{
    error::FeatureError,
    pulse_detection::{
        Real,
        bandpass::BandpassConfig,
        risetime::RisetimeConfig,
        savitzky_golay::DerivativeConfig,
        window::WindowConfig,
    },
};
use anyhow::{Result, bail};
use clap::Parser;

/// Per-level noise thresholds of the preamp denoiser, finest level first.
pub(crate) const DEFAULT_NOISE_THRESHOLDS: [Real; 6] = [
    0.00835124911162,
    0.0177156746346,
    0.020878122779,
    0.0265735119519,
    0.0334049964465,
    0.0413365741474,
];

/// Constants of the feature extraction. Times are in seconds,
/// frequencies in hertz and voltages in volts.
#[derive(Debug, Clone, Parser)]
pub(crate) struct AnalysisParameters {
    /// Length of the pre-pulse window averaged for channel baselines.
    #[clap(long, default_value = "280e-6")]
    pub(crate) baseline_window: Real,

    /// Cutoff of the low-pass smoothing filter.
    #[clap(long, default_value = "100e3")]
    pub(crate) bandpass_cutoff: Real,

    /// Veto samples at or below this voltage lie in a veto region.
    #[clap(long, default_value = "-0.2", allow_negative_numbers = true)]
    pub(crate) veto_threshold: Real,

    #[clap(long, default_value = "6")]
    pub(crate) wavelet_levels: usize,

    #[clap(long, default_value = "0.8")]
    pub(crate) wavelet_scaler: Real,

    /// Comma separated noise threshold per decomposition level, finest first.
    #[clap(long, value_delimiter = ',', default_values_t = DEFAULT_NOISE_THRESHOLDS)]
    pub(crate) noise_thresholds: Vec<Real>,

    /// Estimate each level's noise threshold from its coefficients
    /// instead of using the calibration table.
    #[clap(long)]
    pub(crate) adaptive_thresholds: bool,

    /// Start of the pulse window, measured from the start of the cropped trace.
    #[clap(long, default_value = "100e-6")]
    pub(crate) pulse_window_offset: Real,

    #[clap(long, default_value = "30e-6")]
    pub(crate) pulse_window_duration: Real,

    /// Half width of the rising edge assumed when the derivative has no region.
    #[clap(long, default_value = "2e-6")]
    pub(crate) fallback_half_width: Real,

    /// Ramp of the local baseline and peak height estimates.
    #[clap(long, default_value = "1e-6")]
    pub(crate) estimation_ramp: Real,

    #[clap(long, default_value = "0.1")]
    pub(crate) risetime_initial: Real,

    #[clap(long, default_value = "0.9")]
    pub(crate) risetime_final: Real,

    /// Find the initial crossing by walking back from this fraction of the peak.
    #[clap(long)]
    pub(crate) risetime_scan_to: Option<Real>,

    #[clap(long, default_value = "6")]
    pub(crate) derivative_half_width: usize,

    #[clap(long, default_value = "2")]
    pub(crate) derivative_poly_order: usize,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self::parse_from([env!("CARGO_PKG_NAME")])
    }
}

impl AnalysisParameters {
    /// Checks everything which would otherwise fail every event alike.
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.adaptive_thresholds && self.noise_thresholds.len() != self.wavelet_levels {
            return Err(FeatureError::DimensionMismatch {
                expected: self.wavelet_levels,
                found: self.noise_thresholds.len(),
            }
            .into());
        }
        if self.wavelet_levels == 0 {
            bail!("At least one wavelet level is required");
        }
        if self.derivative_half_width == 0
            || self.derivative_poly_order == 0
            || self.derivative_poly_order > 2 * self.derivative_half_width
        {
            bail!(
                "Derivative polynomial order {} does not fit {} samples",
                self.derivative_poly_order,
                2 * self.derivative_half_width + 1
            );
        }
        if !(0.0 < self.risetime_initial && self.risetime_initial < self.risetime_final) {
            bail!(
                "Rise time fractions must satisfy 0 < {} < {}",
                self.risetime_initial,
                self.risetime_final
            );
        }
        if self.pulse_window_duration <= 0.0 {
            bail!("Pulse window duration must be positive");
        }
        Ok(())
    }

    pub(crate) fn baseline(&self) -> WindowConfig {
        WindowConfig::flat(0.0, self.baseline_window)
    }

    pub(crate) fn bandpass(&self, sampling_frequency: Real) -> BandpassConfig {
        BandpassConfig::new(self.bandpass_cutoff, sampling_frequency)
    }

    pub(crate) fn fixed_thresholds(&self) -> Option<&[Real]> {
        (!self.adaptive_thresholds).then_some(self.noise_thresholds.as_slice())
    }

    pub(crate) fn derivative(&self) -> DerivativeConfig {
        DerivativeConfig {
            half_width: self.derivative_half_width,
            poly_order: self.derivative_poly_order,
        }
    }

    pub(crate) fn risetime(&self) -> RisetimeConfig {
        RisetimeConfig {
            initial_fraction: self.risetime_initial,
            final_fraction: self.risetime_final,
            scan_to_fraction: self.risetime_scan_to,
        }
    }
}
