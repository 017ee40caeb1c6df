use crate::{
    error::FeatureError,
    parameters::AnalysisParameters,
    pulse_detection::{
        ExtremumKind, Real, Waveform, bandpass, find_extremum, find_regions,
        risetime::{self, Risetime},
        savitzky_golay, wavelet,
        window::{self, WindowConfig},
    },
};
use bege_common::{
    ChannelRole, SampleIndex,
    metrics::{channels, names::RISETIME_FALLBACKS},
    record::{ChannelFeature, PulseRegion, RisetimeFeature},
};
use metrics::counter;
use tracing::{debug, trace};

/// Amplitude features of an energy channel. Shaped channels are low-pass
/// filtered before the baseline and average are measured, preamp channels
/// are measured raw. The extrema are always those of the raw trace.
#[tracing::instrument(skip_all, level = "trace", fields(channel = %role))]
pub(crate) fn find_channel_features(
    samples: &[Real],
    sampling_frequency: Real,
    role: ChannelRole,
    parameters: &AnalysisParameters,
) -> Result<ChannelFeature, FeatureError> {
    let raw = Waveform::new(samples.to_vec(), sampling_frequency);
    let maximum = find_extremum(raw.samples(), ExtremumKind::Maximum)?;
    let minimum = find_extremum(raw.samples(), ExtremumKind::Minimum)?;

    let measured = if role.is_shaped() {
        bandpass::smooth(&raw, parameters.bandpass(sampling_frequency))
    } else {
        raw
    };
    let baseline = window::estimate(&measured, parameters.baseline())?;
    let average = find_extremum(measured.samples(), ExtremumKind::Maximum)?;

    Ok(ChannelFeature {
        baseline,
        maximum: maximum.value,
        minimum: minimum.value,
        average: average.value,
    })
}

/// Where the rising edge of a pulse lies, in seconds from the start of
/// the pulse window. `region` is the derivative region it came from, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RisingEdge {
    pub(crate) start: Real,
    pub(crate) end: Real,
    pub(crate) region: Option<PulseRegion>,
}

/// Crops the trace to a power of two and wavelet denoises it. Returns the
/// number of samples cropped from the front along with the denoised trace.
fn denoise(
    raw: &Waveform,
    parameters: &AnalysisParameters,
) -> Result<(SampleIndex, Waveform), FeatureError> {
    let (crop_offset, cropped) = raw.cropped_to_dyadic()?;
    let mut decomposition = wavelet::decompose(&cropped, parameters.wavelet_levels)?;
    let levels = wavelet::threshold(
        &mut decomposition,
        parameters.wavelet_scaler,
        parameters.fixed_thresholds(),
    )?;
    trace!("Wavelet thresholds: {levels:?}");
    Ok((crop_offset, wavelet::reconstruct(&decomposition)))
}

/// Finds the half maximum region of the steepest descent, falling back to a
/// fixed width about the steepest sample when there is no region.
pub(crate) fn locate_rising_edge(
    pulse: &Waveform,
    parameters: &AnalysisParameters,
) -> Result<RisingEdge, FeatureError> {
    let slope = savitzky_golay::differentiate(pulse, parameters.derivative());
    let steepest = find_extremum(slope.samples(), ExtremumKind::Minimum)?;
    let regions = find_regions(slope.samples(), 0.5 * steepest.value);
    let region = regions
        .iter()
        .find(|region| region.contains(steepest.index))
        .or(regions.first())
        .copied();
    Ok(match region {
        Some(region) => RisingEdge {
            start: pulse.time_of(region.beginning),
            end: pulse.time_of(region.end),
            region: Some(region),
        },
        None => {
            let centre = pulse.time_of(steepest.index);
            RisingEdge {
                start: centre - parameters.fallback_half_width,
                end: centre + parameters.fallback_half_width,
                region: None,
            }
        }
    })
}

/// A pulse which never crosses both levels has no rise time, which is
/// expected for a small fraction of noisy pulses.
fn measure_risetime(
    pulse: &Waveform,
    peak_height: Real,
    scan_from: SampleIndex,
    role: ChannelRole,
    parameters: &AnalysisParameters,
) -> Result<Option<Risetime>, FeatureError> {
    match risetime::extract(pulse, peak_height, scan_from, parameters.risetime()) {
        Ok(risetime) => Ok(Some(risetime)),
        Err(error @ FeatureError::NoCrossingFound { .. }) => {
            debug!("No rise time: {error}");
            counter!(RISETIME_FALLBACKS, &[channels::get_label(role)]).increment(1);
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

/// Timing features of a preamp channel.
///
/// The trace is cropped to a power of two, wavelet denoised, and the pulse
/// window cut out of it. The rising edge is located from the smoothed
/// derivative, widened, and used to place the local baseline and peak
/// height estimates before the crossings are measured.
#[tracing::instrument(skip_all, level = "trace", fields(channel = %role))]
pub(crate) fn find_risetime_features(
    samples: &[Real],
    sampling_frequency: Real,
    role: ChannelRole,
    parameters: &AnalysisParameters,
) -> Result<RisetimeFeature, FeatureError> {
    let raw = Waveform::new(samples.to_vec(), sampling_frequency);

    let smoothed = bandpass::smooth(&raw, parameters.bandpass(sampling_frequency));
    let rough_maximum = find_extremum(smoothed.samples(), ExtremumKind::Maximum)?;
    let rough_minimum = find_extremum(smoothed.samples(), ExtremumKind::Minimum)?;

    let (crop_offset, denoised) = denoise(&raw, parameters)?;
    let window_start = denoised.index_of(parameters.pulse_window_offset);
    let window_end = window_start + denoised.samples_in(parameters.pulse_window_duration);
    let mut pulse = denoised.slice(window_start..window_end);
    if pulse.is_empty() {
        return Err(FeatureError::InvalidWindow {
            start: window_start,
            width: window_end - window_start,
            length: denoised.len(),
        });
    }

    let edge = locate_rising_edge(&pulse, parameters)?;
    trace!(region = ?edge.region, "Rising edge located");
    let half_width = 0.5 * (edge.end - edge.start);
    let ramp = parameters.estimation_ramp;
    // Widen by a full width at half maximum on each side
    let start = (edge.start - 2.0 * half_width).max(0.0);
    let end = (edge.end + 2.0 * half_width).min(pulse.duration() - ramp);
    debug!("Rising edge between {start:e} s and {end:e} s of the pulse window");

    let baseline_delay = if start < ramp { start } else { start - ramp };
    let baseline = window::estimate(&pulse, WindowConfig::new(baseline_delay, 0.0, ramp))?;
    pulse.subtract(baseline);
    let peak_height = window::estimate(&pulse, WindowConfig::new(end, 0.0, ramp))?;

    let scan_from = pulse.index_of(start);
    let risetime = measure_risetime(&pulse, peak_height, scan_from, role, parameters)?;

    let window_origin = raw.time_of(crop_offset + window_start);
    let crossing_time = |index| window_origin + pulse.time_of(index);
    Ok(RisetimeFeature {
        initial_crossing: risetime.map(|r| crossing_time(r.initial_crossing)),
        final_crossing: risetime.map(|r| crossing_time(r.final_crossing)),
        risetime: risetime.map(|r| r.risetime),
        rough_maximum: rough_maximum.value,
        rough_minimum: rough_minimum.value,
        rough_maximum_position: rough_maximum.index,
        rough_minimum_position: rough_minimum.index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use trace_reader::simulate::Pulse;

    const FS: Real = 20e6;

    fn trace_with(pulse: Pulse, len: usize) -> Vec<Real> {
        let mut trace = vec![0.0; len];
        pulse.add_to(&mut trace);
        trace
    }

    #[test]
    fn shaped_channel_features() {
        let pulse = Pulse::ExponentialRise {
            onset: 5800,
            peak: 6000,
            rise: 50.0,
            decay: 200.0,
            amplitude: 0.4,
        };
        let mut trace = trace_with(pulse, 8000);
        trace.iter_mut().for_each(|v| *v += 0.1);

        let feature = find_channel_features(
            &trace,
            FS,
            ChannelRole::ShapedLongLowEnergy,
            &AnalysisParameters::default(),
        )
        .expect("trace is analysable");
        assert_approx_eq!(feature.baseline, 0.1, 1e-9);
        assert_approx_eq!(feature.maximum, 0.5, 1e-9);
        assert_approx_eq!(feature.minimum, 0.1, 1e-9);
        assert!(feature.average < feature.maximum);
        assert!(feature.average > 0.45);
    }

    #[test]
    fn preamp_amplitudes_are_raw() {
        let mut trace = vec![0.0; 8000];
        trace[7000] = -0.3;
        trace[7001] = 0.2;
        let feature = find_channel_features(
            &trace,
            FS,
            ChannelRole::PreampHighEnergy,
            &AnalysisParameters::default(),
        )
        .expect("trace is analysable");
        assert_eq!(feature.baseline, 0.0);
        assert_eq!(feature.maximum, 0.2);
        assert_eq!(feature.average, 0.2);
        assert_eq!(feature.minimum, -0.3);
    }

    #[test]
    fn preamp_pulse_scenario() {
        // flat for the cropped prefix, then a noise free pulse peaking in the
        // pulse window of the 4096 sample analysis window
        let pulse = Pulse::ExponentialRise {
            onset: 4400,
            peak: 4500,
            rise: 30.0,
            decay: 5000.0,
            amplitude: -1.0,
        };
        let trace = trace_with(pulse, 8000);
        let parameters = AnalysisParameters {
            pulse_window_offset: 10e-6,
            ..Default::default()
        };

        let feature =
            find_risetime_features(&trace, FS, ChannelRole::PreampLowEnergy, &parameters)
                .expect("pulse is analysable");
        assert_approx_eq!(feature.rough_minimum, -1.0, 0.05);
        assert!((4450..4560).contains(&feature.rough_minimum_position));
        assert!(feature.rough_maximum < 0.05);

        let designed = (pulse.crossing(0.9) - pulse.crossing(0.1)) / FS;
        let risetime = feature.risetime.expect("pulse crosses both levels");
        assert!(risetime > 0.0);
        assert!(risetime < designed + 1.0 / FS);

        let initial = feature.initial_crossing.expect("pulse crosses both levels");
        let last = feature.final_crossing.expect("pulse crosses both levels");
        assert!(4400.0 / FS <= initial);
        assert!(initial < last);
        assert!(last <= 4500.0 / FS);
        assert_approx_eq!(last - initial, risetime, 1e-12);
    }

    #[test]
    fn rising_edge_from_derivative_region() {
        // falls linearly from 0 to -1 over samples 290 to 310
        let samples = (0..600)
            .map(|i| match i {
                0..290 => 0.0,
                290..310 => -((i - 290) as Real) / 20.0,
                _ => -1.0,
            })
            .collect();
        let pulse = Waveform::new(samples, FS);
        let edge = locate_rising_edge(&pulse, &AnalysisParameters::default())
            .expect("window is not empty");
        let region = edge.region.expect("the fall has a region");
        assert!(region.contains(300));
        assert!(region.beginning > 280 && region.end < 320);
        assert_eq!(edge.start, pulse.time_of(region.beginning));
        assert_eq!(edge.end, pulse.time_of(region.end));
    }

    #[test]
    fn rising_edge_fallback_without_region() {
        let pulse = Waveform::new(vec![Real::NAN; 600], FS);
        let parameters = AnalysisParameters::default();
        let edge = locate_rising_edge(&pulse, &parameters).expect("window is not empty");
        assert_eq!(edge.region, None);
        assert_approx_eq!(edge.end - edge.start, 2.0 * parameters.fallback_half_width, 1e-12);
    }

    #[test]
    fn missing_crossing_is_not_an_error() {
        let pulse = Waveform::new(vec![0.0, -0.1, -0.2, -0.3], FS);
        let parameters = AnalysisParameters::default();
        assert_eq!(
            measure_risetime(&pulse, -1.0, 0, ChannelRole::PreampLowEnergy, &parameters),
            Ok(None)
        );
        let found = measure_risetime(&pulse, -0.3, 0, ChannelRole::PreampLowEnergy, &parameters)
            .expect("crossings are found");
        assert!(found.is_some());
    }

    #[test]
    fn unusable_traces() {
        let parameters = AnalysisParameters::default();
        assert_eq!(
            find_channel_features(&[], FS, ChannelRole::ShapedShortLowEnergy, &parameters),
            Err(FeatureError::EmptyWaveform)
        );
        assert_eq!(
            find_risetime_features(&[], FS, ChannelRole::PreampLowEnergy, &parameters),
            Err(FeatureError::EmptyWaveform)
        );
        assert_eq!(
            find_risetime_features(&[0.0; 40], FS, ChannelRole::PreampLowEnergy, &parameters),
            Err(FeatureError::InsufficientLength {
                length: 32,
                levels: 6
            })
        );
        assert_eq!(
            find_risetime_features(&[0.0; 1024], FS, ChannelRole::PreampLowEnergy, &parameters),
            Err(FeatureError::InvalidWindow {
                start: 2000,
                width: 600,
                length: 1024
            })
        );
    }
}
