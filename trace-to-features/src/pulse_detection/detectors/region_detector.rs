use super::{Detector, EventFilter, Real};
use bege_common::{SampleIndex, record::PulseRegion};
use std::marker::PhantomData;

pub(crate) trait ThresholdClass: Default + Clone {
    fn test(value: Real, threshold: Real) -> bool;
}

#[derive(Default, Clone)]
pub(crate) struct UpperThreshold {}
impl ThresholdClass for UpperThreshold {
    fn test(value: Real, threshold: Real) -> bool {
        value >= threshold
    }
}

#[derive(Default, Clone)]
pub(crate) struct LowerThreshold {}
impl ThresholdClass for LowerThreshold {
    fn test(value: Real, threshold: Real) -> bool {
        value <= threshold
    }
}

/// Reports each maximal run of samples passing the threshold as an
/// inclusive [PulseRegion].
#[derive(Default, Clone)]
pub(crate) struct RegionDetector<Class: ThresholdClass> {
    threshold: Real,
    beginning: Option<SampleIndex>,
    last: SampleIndex,
    phantom: PhantomData<Class>,
}

impl<Class: ThresholdClass> RegionDetector<Class> {
    pub(crate) fn new(threshold: Real) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }
}

impl<Class: ThresholdClass> Detector for RegionDetector<Class> {
    type EventPointType = PulseRegion;

    fn signal(&mut self, index: SampleIndex, value: Real) -> Option<PulseRegion> {
        let inside = Class::test(value, self.threshold);
        let closed = match self.beginning {
            Some(beginning) if !inside => {
                self.beginning = None;
                Some(PulseRegion::new(beginning, self.last))
            }
            None if inside => {
                self.beginning = Some(index);
                None
            }
            _ => None,
        };
        self.last = index;
        closed
    }

    fn finish(&mut self) -> Option<PulseRegion> {
        self.beginning
            .take()
            .map(|beginning| PulseRegion::new(beginning, self.last))
    }
}

/// Finds the regions where `samples` lie at or beyond `threshold`. A
/// negative threshold finds runs at or below it, otherwise runs at or
/// above it. Regions are in ascending order. No region is not an error.
pub(crate) fn find_regions(samples: &[Real], threshold: Real) -> Vec<PulseRegion> {
    let points = samples.iter().copied().enumerate();
    if threshold < 0.0 {
        points
            .events(RegionDetector::<LowerThreshold>::new(threshold))
            .collect()
    } else {
        points
            .events(RegionDetector::<UpperThreshold>::new(threshold))
            .collect()
    }
}
