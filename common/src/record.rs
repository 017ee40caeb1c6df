//! The derived per-event record written by the analysis and read by the
//! downstream event selection. Field names and units (volts, seconds,
//! sample indices) are part of the output format and must stay stable.

use crate::{EntryIndex, Real, SampleIndex, Timestamp};
use serde::{Deserialize, Serialize};

/// A contiguous run of samples which satisfied a threshold condition.
/// Both ends are inclusive.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseRegion {
    pub beginning: SampleIndex,
    pub end: SampleIndex,
}

impl PulseRegion {
    pub fn new(beginning: SampleIndex, end: SampleIndex) -> Self {
        Self { beginning, end }
    }

    pub fn contains(&self, index: SampleIndex) -> bool {
        self.beginning <= index && index <= self.end
    }

    /// Number of samples in the region, which is never zero.
    pub fn len(&self) -> usize {
        self.end - self.beginning + 1
    }
}

/// The regions in which the muon veto fired, in ascending sample order.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VetoRegions(Vec<PulseRegion>);

impl VetoRegions {
    pub fn new(regions: Vec<PulseRegion>) -> Self {
        Self(regions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PulseRegion> {
        self.0.iter()
    }

    pub fn is_in_veto_region(&self, index: SampleIndex) -> bool {
        self.0.iter().any(|region| region.contains(index))
    }

    /// True if the inclusive range `[beginning, end]` overlaps any veto region,
    /// either by having an end point inside one or by enclosing one entirely.
    pub fn range_is_in_veto_region(&self, beginning: SampleIndex, end: SampleIndex) -> bool {
        self.is_in_veto_region(beginning)
            || self.is_in_veto_region(end)
            || self
                .0
                .iter()
                .any(|region| beginning <= region.beginning && end >= region.end)
    }
}

impl From<Vec<PulseRegion>> for VetoRegions {
    fn from(regions: Vec<PulseRegion>) -> Self {
        Self::new(regions)
    }
}

/// Amplitude features of one energy-bearing channel, in volts.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelFeature {
    pub baseline: Real,
    pub maximum: Real,
    pub minimum: Real,
    pub average: Real,
}

/// Timing features of one preamp channel.
///
/// Crossing times are in seconds from the start of the raw trace, the
/// rise time in seconds. They are `None` when the pulse never crossed
/// both thresholds.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RisetimeFeature {
    pub initial_crossing: Option<Real>,
    pub final_crossing: Option<Real>,
    pub risetime: Option<Real>,
    pub rough_maximum: Real,
    pub rough_minimum: Real,
    pub rough_maximum_position: SampleIndex,
    pub rough_minimum_position: SampleIndex,
}

impl RisetimeFeature {
    pub fn is_valid(&self) -> bool {
        self.risetime.is_some()
    }
}

/// Everything derived from one recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Index of the event in the input source.
    pub entry: EntryIndex,
    pub timestamp: Timestamp,
    pub pulser_on: bool,
    pub veto_regions: VetoRegions,
    /// One entry per [crate::ChannelRole::ENERGY] role, in that order.
    pub channels: [ChannelFeature; 5],
    /// One entry per [crate::ChannelRole::PREAMP] role, in that order.
    pub risetimes: [RisetimeFeature; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn veto() -> VetoRegions {
        vec![PulseRegion::new(10, 20), PulseRegion::new(40, 45)].into()
    }

    #[test]
    fn region_contains_its_end_points() {
        let region = PulseRegion::new(3, 3);
        assert!(region.contains(3));
        assert!(!region.contains(2));
        assert!(!region.contains(4));
        assert_eq!(region.len(), 1);
    }

    #[test]
    fn point_in_veto_region() {
        let veto = veto();
        assert!(veto.is_in_veto_region(10));
        assert!(veto.is_in_veto_region(20));
        assert!(veto.is_in_veto_region(42));
        assert!(!veto.is_in_veto_region(21));
        assert!(!veto.is_in_veto_region(0));
    }

    #[test]
    fn range_overlaps() {
        let veto = veto();
        // inside
        assert!(veto.range_is_in_veto_region(12, 18));
        // beginning inside
        assert!(veto.range_is_in_veto_region(15, 30));
        // end inside
        assert!(veto.range_is_in_veto_region(0, 10));
        // enclosing
        assert!(veto.range_is_in_veto_region(30, 50));
        assert!(!veto.range_is_in_veto_region(21, 39));
        assert!(!VetoRegions::default().range_is_in_veto_region(0, 100));
    }

    #[test]
    fn record_serialises_with_stable_field_names() {
        let record = EventRecord {
            entry: 7,
            timestamp: 123,
            pulser_on: true,
            veto_regions: veto(),
            channels: [ChannelFeature::default(); 5],
            risetimes: [RisetimeFeature::default(); 2],
        };
        let json = serde_json::to_value(&record).expect("record should serialise");
        assert_eq!(json["entry"], 7);
        assert_eq!(json["veto_regions"][1]["beginning"], 40);
        assert_eq!(json["channels"].as_array().map(Vec::len), Some(5));
        assert!(json["risetimes"][0]["risetime"].is_null());

        let back: EventRecord = serde_json::from_value(json).expect("record should deserialise");
        assert_eq!(back, record);
    }
}
