use super::Real;
use crate::error::FeatureError;
use bege_common::SampleIndex;
use std::ops::Range;

/// Absorbs the rounding error of `time * frequency` so that, e.g.,
/// 100 µs at 20 MHz is sample 2000 and not 1999.
const INDEX_TOLERANCE: Real = 1e-6;

/// A uniformly sampled trace.
///
/// Transforms return new waveforms, the only in-place operation is
/// [Waveform::subtract].
#[derive(Default, Debug, Clone, PartialEq)]
pub(crate) struct Waveform {
    samples: Vec<Real>,
    sampling_frequency: Real,
}

impl Waveform {
    pub(crate) fn new(samples: Vec<Real>, sampling_frequency: Real) -> Self {
        Self {
            samples,
            sampling_frequency,
        }
    }

    /// A waveform with the same sampling frequency as `self`.
    pub(crate) fn with_samples(&self, samples: Vec<Real>) -> Self {
        Self::new(samples, self.sampling_frequency)
    }

    pub(crate) fn samples(&self) -> &[Real] {
        &self.samples
    }

    pub(crate) fn len(&self) -> usize {
        self.samples.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub(crate) fn sampling_frequency(&self) -> Real {
        self.sampling_frequency
    }

    pub(crate) fn sampling_period(&self) -> Real {
        1.0 / self.sampling_frequency
    }

    pub(crate) fn duration(&self) -> Real {
        self.len() as Real * self.sampling_period()
    }

    /// Time in seconds of the sample at `index`.
    pub(crate) fn time_of(&self, index: SampleIndex) -> Real {
        index as Real * self.sampling_period()
    }

    /// Index of the sample at `time`, truncated. Negative times map to 0.
    pub(crate) fn index_of(&self, time: Real) -> SampleIndex {
        (time * self.sampling_frequency + INDEX_TOLERANCE).floor().max(0.0) as SampleIndex
    }

    /// Number of whole samples spanned by `duration`.
    pub(crate) fn samples_in(&self, duration: Real) -> usize {
        self.index_of(duration)
    }

    /// A copy of the samples in `range`, clamped to the waveform.
    pub(crate) fn slice(&self, range: Range<SampleIndex>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        self.with_samples(self.samples.get(start..end).unwrap_or_default().to_vec())
    }

    /// Subtracts `value` from every sample, in place.
    pub(crate) fn subtract(&mut self, value: Real) {
        self.samples.iter_mut().for_each(|sample| *sample -= value);
    }

    /// Drops the prefix so the remaining length is the largest power of two
    /// not exceeding the current length. Returns the number of samples dropped.
    pub(crate) fn cropped_to_dyadic(&self) -> Result<(SampleIndex, Self), FeatureError> {
        if self.is_empty() {
            return Err(FeatureError::EmptyWaveform);
        }
        let kept = 1_usize << self.len().ilog2();
        let offset = self.len() - kept;
        Ok((offset, self.slice(offset..self.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn time_and_index_agree() {
        let waveform = Waveform::new(vec![0.0; 8000], 20e6);
        assert_approx_eq!(waveform.sampling_period(), 50e-9);
        assert_eq!(waveform.index_of(100e-6), 2000);
        assert_eq!(waveform.index_of(280e-6), 5600);
        assert_eq!(waveform.index_of(-1e-6), 0);
        assert_eq!(waveform.index_of(waveform.time_of(1234)), 1234);
        assert_approx_eq!(waveform.duration(), 400e-6);
    }

    #[test]
    fn slice_is_clamped() {
        let waveform = Waveform::new((0..10).map(|i| i as Real).collect(), 1.0);
        assert_eq!(waveform.slice(2..5).samples(), &[2.0, 3.0, 4.0]);
        assert_eq!(waveform.slice(8..20).samples(), &[8.0, 9.0]);
        assert!(waveform.slice(12..20).is_empty());
    }

    #[test]
    fn subtract_in_place() {
        let mut waveform = Waveform::new(vec![1.0, 2.0], 1.0);
        waveform.subtract(0.5);
        assert_eq!(waveform.samples(), &[0.5, 1.5]);
    }

    #[test]
    fn dyadic_crop_of_digitizer_trace() {
        let waveform = Waveform::new((0..8000).map(|i| i as Real).collect(), 20e6);
        let (offset, cropped) = waveform.cropped_to_dyadic().expect("trace is not empty");
        assert_eq!(offset, 3904);
        assert_eq!(cropped.len(), 4096);
        assert_eq!(cropped.samples().first(), Some(&3904.0));
    }

    #[test]
    fn dyadic_crop_of_power_of_two_is_identity() {
        let waveform = Waveform::new(vec![1.0; 64], 1.0);
        let (offset, cropped) = waveform.cropped_to_dyadic().expect("trace is not empty");
        assert_eq!(offset, 0);
        assert_eq!(cropped, waveform);
        assert_eq!(
            Waveform::default().cropped_to_dyadic(),
            Err(FeatureError::EmptyWaveform)
        );
    }
}
