//! Synthetic events, for exercising the analysis without detector data.
use super::EventView;
use bege_common::{CHANNELS_PER_EVENT, ChannelRole, Real, SampleIndex, Timestamp};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// A pulse shape injected into a trace. Positions are sample indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pulse {
    Flat {
        start: SampleIndex,
        stop: SampleIndex,
        amplitude: Real,
    },
    /// A saturating exponential rise from `onset`, scaled to reach
    /// `amplitude` exactly at `peak`, followed by an exponential decay.
    ExponentialRise {
        onset: SampleIndex,
        peak: SampleIndex,
        rise: Real,
        decay: Real,
        amplitude: Real,
    },
}

impl Pulse {
    pub fn value_at(&self, index: SampleIndex) -> Real {
        match *self {
            Pulse::Flat {
                start,
                stop,
                amplitude,
            } => {
                if (start..stop).contains(&index) {
                    amplitude
                } else {
                    0.0
                }
            }
            Pulse::ExponentialRise {
                onset,
                peak,
                rise,
                decay,
                amplitude,
            } => {
                if index < onset {
                    0.0
                } else if index <= peak {
                    let t = (index - onset) as Real;
                    amplitude * (1.0 - (-t / rise).exp()) / self.rise_norm()
                } else {
                    amplitude * (-((index - peak) as Real) / decay).exp()
                }
            }
        }
    }

    fn rise_norm(&self) -> Real {
        match *self {
            Pulse::Flat { .. } => 1.0,
            Pulse::ExponentialRise {
                onset, peak, rise, ..
            } => 1.0 - (-((peak - onset) as Real) / rise).exp(),
        }
    }

    /// The fractional sample position at which the rising edge first
    /// reaches `fraction` of the amplitude.
    pub fn crossing(&self, fraction: Real) -> Real {
        match *self {
            Pulse::Flat { start, .. } => start as Real,
            Pulse::ExponentialRise { onset, rise, .. } => {
                onset as Real - rise * (1.0 - fraction * self.rise_norm()).ln()
            }
        }
    }

    pub fn add_to(&self, trace: &mut [Real]) {
        for (i, value) in trace.iter_mut().enumerate() {
            *value += self.value_at(i);
        }
    }
}

/// Builds events with a common baseline and additive gaussian noise.
#[derive(Debug, Clone)]
pub struct EventSimulator {
    pub waveform_length: usize,
    pub sampling_frequency: Real,
    pub noise_sd: Real,
}

impl EventSimulator {
    pub fn new(waveform_length: usize, sampling_frequency: Real, noise_sd: Real) -> Self {
        Self {
            waveform_length,
            sampling_frequency,
            noise_sd,
        }
    }

    /// Creates an event whose traces contain `pulses[role]` on top of noise.
    pub fn event<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        pulses: &[Vec<Pulse>; CHANNELS_PER_EVENT],
        pulser_chunks: [u32; 2],
        timestamp: Timestamp,
    ) -> EventView {
        let noise = Normal::new(0.0, self.noise_sd.max(0.0)).ok();
        let traces = std::array::from_fn(|c| {
            let mut trace: Vec<Real> = match &noise {
                Some(noise) if self.noise_sd > 0.0 => {
                    noise.sample_iter(&mut *rng).take(self.waveform_length).collect()
                }
                _ => vec![0.0; self.waveform_length],
            };
            for pulse in &pulses[c] {
                pulse.add_to(&mut trace);
            }
            trace
        });
        EventView {
            traces,
            sampling_frequency: self.sampling_frequency,
            pulser_chunks,
            timestamp,
        }
    }

    /// A typical physics event: slow positive shaped pulses proportional to
    /// `energy` and a fast negative preamp pulse peaking at `peak`.
    pub fn typical_pulses(&self, energy: Real, peak: SampleIndex) -> [Vec<Pulse>; CHANNELS_PER_EVENT] {
        let shaped = |rise: Real, decay: Real, gain: Real| Pulse::ExponentialRise {
            onset: peak.saturating_sub(4 * rise as usize),
            peak,
            rise,
            decay,
            amplitude: gain * energy,
        };
        let preamp = |gain: Real| Pulse::ExponentialRise {
            onset: peak.saturating_sub(20),
            peak,
            rise: 8.0,
            decay: 5000.0,
            amplitude: -gain * energy,
        };
        let mut pulses: [Vec<Pulse>; CHANNELS_PER_EVENT] = Default::default();
        pulses[ChannelRole::ShapedShortLowEnergy.index()].push(shaped(30.0, 120.0, 1.0));
        pulses[ChannelRole::ShapedLongLowEnergy.index()].push(shaped(50.0, 200.0, 1.0));
        pulses[ChannelRole::ShapedLongHighEnergy.index()].push(shaped(50.0, 200.0, 0.1));
        pulses[ChannelRole::PreampLowEnergy.index()].push(preamp(1.0));
        pulses[ChannelRole::PreampHighEnergy.index()].push(preamp(0.1));
        pulses
    }
}
