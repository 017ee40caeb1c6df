//! Percentage-of-peak threshold crossings on the rising edge of a pulse.
use super::{Real, Waveform};
use crate::error::FeatureError;
use bege_common::SampleIndex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RisetimeConfig {
    pub(crate) initial_fraction: Real,
    pub(crate) final_fraction: Real,
    /// If set, the initial crossing is found by walking back from the
    /// first sample reaching this fraction of the peak.
    pub(crate) scan_to_fraction: Option<Real>,
}

impl Default for RisetimeConfig {
    fn default() -> Self {
        Self {
            initial_fraction: 0.1,
            final_fraction: 0.9,
            scan_to_fraction: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Risetime {
    pub(crate) initial_crossing: SampleIndex,
    pub(crate) final_crossing: SampleIndex,
    /// Seconds between the two crossings.
    pub(crate) risetime: Real,
}

/// The sign of the peak height sets the direction of the pulse.
#[derive(Debug, Clone, Copy)]
struct Level {
    value: Real,
    negative: bool,
}

impl Level {
    fn new(fraction: Real, peak_height: Real) -> Self {
        Self {
            value: fraction * peak_height,
            negative: peak_height < 0.0,
        }
    }

    fn is_reached_by(&self, sample: Real) -> bool {
        if self.negative {
            sample <= self.value
        } else {
            sample >= self.value
        }
    }

    /// Index of the first sample from `from` onwards reaching the level.
    fn first_crossing(&self, samples: &[Real], from: SampleIndex) -> Result<SampleIndex, FeatureError> {
        samples
            .iter()
            .skip(from)
            .position(|&sample| self.is_reached_by(sample))
            .map(|offset| from + offset)
            .ok_or(FeatureError::NoCrossingFound {
                level: self.value,
                scan_from: from,
            })
    }
}

pub(crate) fn extract(
    waveform: &Waveform,
    peak_height: Real,
    scan_from: SampleIndex,
    config: RisetimeConfig,
) -> Result<Risetime, FeatureError> {
    if waveform.is_empty() {
        return Err(FeatureError::EmptyWaveform);
    }
    let samples = waveform.samples();
    let initial = Level::new(config.initial_fraction, peak_height);

    let initial_crossing = match config.scan_to_fraction {
        None => initial.first_crossing(samples, scan_from)?,
        Some(fraction) => {
            let scan_to = Level::new(fraction, peak_height).first_crossing(samples, scan_from)?;
            (scan_from..=scan_to)
                .rev()
                .find(|&i| !initial.is_reached_by(samples[i]))
                .map_or(scan_from, |i| i + 1)
        }
    };
    let final_crossing =
        Level::new(config.final_fraction, peak_height).first_crossing(samples, initial_crossing)?;

    Ok(Risetime {
        initial_crossing,
        final_crossing,
        risetime: (final_crossing - initial_crossing) as Real * waveform.sampling_period(),
    })
}
