//! Trapezoid weighted averages, used to estimate baselines and pulse heights.
use super::{Real, Waveform};
use crate::error::FeatureError;

/// Shape of an averaging window, all durations in seconds.
///
/// The weights ramp linearly up over `ramp_up`, stay at one over
/// `flat_top`, and ramp linearly down over `ramp_down`.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub(crate) struct WindowConfig {
    pub(crate) delay: Real,
    pub(crate) ramp_up: Real,
    pub(crate) flat_top: Real,
    pub(crate) ramp_down: Real,
}

impl WindowConfig {
    pub(crate) fn new(delay: Real, ramp_up: Real, ramp_down: Real) -> Self {
        Self {
            delay,
            ramp_up,
            flat_top: 0.0,
            ramp_down,
        }
    }

    /// An unweighted average over `duration` seconds.
    pub(crate) fn flat(delay: Real, duration: Real) -> Self {
        Self {
            delay,
            flat_top: duration,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Trapezoid {
    up: usize,
    flat: usize,
    down: usize,
}

impl Trapezoid {
    fn width(&self) -> usize {
        self.up + self.flat + self.down
    }

    fn weight(&self, k: usize) -> Real {
        if k < self.up {
            (k + 1) as Real / (self.up + 1) as Real
        } else if k < self.up + self.flat {
            1.0
        } else {
            (self.width() - k) as Real / self.down as Real
        }
    }
}

/// Weighted average of the samples in the window described by `config`.
///
/// A window of zero width is the single sample at `delay`. Samples outside
/// the waveform are ignored.
pub(crate) fn estimate(waveform: &Waveform, config: WindowConfig) -> Result<Real, FeatureError> {
    if waveform.is_empty() {
        return Err(FeatureError::EmptyWaveform);
    }
    let start = waveform.index_of(config.delay);
    let trapezoid = Trapezoid {
        up: waveform.samples_in(config.ramp_up),
        flat: waveform.samples_in(config.flat_top),
        down: waveform.samples_in(config.ramp_down),
    };

    let (sum, norm) = if trapezoid.width() == 0 {
        waveform
            .samples()
            .get(start)
            .map_or((0.0, 0.0), |&value| (value, 1.0))
    } else {
        waveform
            .samples()
            .iter()
            .skip(start)
            .take(trapezoid.width())
            .enumerate()
            .fold((0.0, 0.0), |(sum, norm), (k, value)| {
                let weight = trapezoid.weight(k);
                (sum + weight * value, norm + weight)
            })
    };

    if norm > 0.0 {
        Ok(sum / norm)
    } else {
        Err(FeatureError::InvalidWindow {
            start,
            width: trapezoid.width(),
            length: waveform.len(),
        })
    }
}
