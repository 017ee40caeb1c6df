//! Windowed-sinc low-pass smoothing.
use super::{super::Waveform, Real, correlate_replicated};
use std::f64::consts::PI;

const MAX_HALF_LENGTH: usize = 2048;

/// The cutoff is a fraction of the sampling frequency, e.g. 100 kHz at
/// 20 MHz is 0.005. A fraction of one half or more passes everything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BandpassConfig {
    pub(crate) cutoff_fraction: Real,
}

impl BandpassConfig {
    pub(crate) fn new(cutoff: Real, sampling_frequency: Real) -> Self {
        Self {
            cutoff_fraction: cutoff / sampling_frequency,
        }
    }

    /// Hamming windowed sinc kernel of odd length, normalised to unit DC gain.
    pub(crate) fn kernel(&self) -> Vec<Real> {
        let fc = self.cutoff_fraction;
        if !(fc > 0.0 && fc < 0.5) {
            return vec![1.0];
        }
        let half = ((1.0 / fc).round() as usize).clamp(1, MAX_HALF_LENGTH);
        let taps = 2 * half + 1;
        let kernel: Vec<Real> = (0..taps)
            .map(|n| {
                let x = n as Real - half as Real;
                let sinc = if x == 0.0 {
                    2.0 * fc
                } else {
                    (2.0 * PI * fc * x).sin() / (PI * x)
                };
                let hamming = 0.54 - 0.46 * (2.0 * PI * n as Real / (taps - 1) as Real).cos();
                sinc * hamming
            })
            .collect();
        let gain: Real = kernel.iter().sum();
        kernel.into_iter().map(|h| h / gain).collect()
    }
}

/// Low-pass filters the waveform. The kernel is symmetric and applied
/// centred, so features keep their sample positions.
pub(crate) fn smooth(waveform: &Waveform, config: BandpassConfig) -> Waveform {
    waveform.with_samples(correlate_replicated(waveform.samples(), &config.kernel()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn config() -> BandpassConfig {
        BandpassConfig::new(100e3, 20e6)
    }

    #[test]
    fn kernel_shape() {
        let kernel = config().kernel();
        assert_eq!(kernel.len(), 401);
        assert_approx_eq!(kernel.iter().sum::<Real>(), 1.0, 1e-12);
        for k in 0..200 {
            assert_approx_eq!(kernel[k], kernel[400 - k], 1e-15);
        }
        let centre = kernel[200];
        assert!(kernel.iter().all(|&h| h <= centre));
    }

    #[test]
    fn pass_through_above_nyquist() {
        assert_eq!(BandpassConfig::new(15e6, 20e6).kernel(), vec![1.0]);
        assert_eq!(
            BandpassConfig {
                cutoff_fraction: 0.0
            }
            .kernel(),
            vec![1.0]
        );
    }

    #[test]
    fn constant_is_preserved() {
        let waveform = Waveform::new(vec![0.3; 1000], 20e6);
        let smoothed = smooth(&waveform, config());
        assert_eq!(smoothed.len(), 1000);
        assert!(smoothed.samples().iter().all(|&v| (v - 0.3).abs() < 1e-9));
    }

    #[test]
    fn symmetric_pulse_keeps_its_position() {
        let samples = (0..2000)
            .map(|i| {
                let x = (i as Real - 1000.0) / 150.0;
                (-x * x).exp()
            })
            .collect();
        let smoothed = smooth(&Waveform::new(samples, 20e6), config());
        let peak = crate::pulse_detection::find_extremum(
            smoothed.samples(),
            crate::pulse_detection::ExtremumKind::Maximum,
        )
        .expect("not empty");
        assert_eq!(peak.index, 1000);
        assert!(peak.value < 1.0 && peak.value > 0.9);
    }
}
