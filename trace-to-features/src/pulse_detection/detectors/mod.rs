pub(crate) mod region_detector;

use super::Real;
use bege_common::SampleIndex;

/// A detector is fed a trace one sample at a time and reports events as
/// soon as they are complete.
pub(crate) trait Detector {
    type EventPointType;

    fn signal(&mut self, index: SampleIndex, value: Real) -> Option<Self::EventPointType>;

    /// Called once after the final sample, to report any event still open.
    fn finish(&mut self) -> Option<Self::EventPointType>;
}

#[derive(Clone)]
pub(crate) struct EventIter<I, D>
where
    I: Iterator<Item = (SampleIndex, Real)>,
    D: Detector,
{
    source: I,
    detector: D,
    finished: bool,
}

impl<I, D> Iterator for EventIter<I, D>
where
    I: Iterator<Item = (SampleIndex, Real)>,
    D: Detector,
{
    type Item = D::EventPointType;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        for (index, value) in &mut self.source {
            if let Some(event) = self.detector.signal(index, value) {
                return Some(event);
            }
        }
        self.finished = true;
        self.detector.finish()
    }
}

pub(crate) trait EventFilter<I, D>
where
    I: Iterator<Item = (SampleIndex, Real)>,
    D: Detector,
{
    fn events(self, detector: D) -> EventIter<I, D>;
}

impl<I, D> EventFilter<I, D> for I
where
    I: Iterator<Item = (SampleIndex, Real)>,
    D: Detector,
{
    fn events(self, detector: D) -> EventIter<I, D> {
        EventIter {
            source: self,
            detector,
            finished: false,
        }
    }
}
