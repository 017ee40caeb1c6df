pub mod metrics;
pub mod record;
pub mod tracer;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

pub type Real = f64;
pub type SampleIndex = usize;
pub type Timestamp = u64;
pub type EntryIndex = usize;

/// Number of waveforms recorded by the digitizer for each trigger.
pub const CHANNELS_PER_EVENT: usize = 6;

/// The role each digitizer channel plays in the analysis.
/// The discriminant is the channel's position in the recorded event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum ChannelRole {
    #[strum(to_string = "shaped_6us_low_energy")]
    ShapedShortLowEnergy = 0,
    #[strum(to_string = "shaped_10us_low_energy")]
    ShapedLongLowEnergy = 1,
    #[strum(to_string = "shaped_10us_high_energy")]
    ShapedLongHighEnergy = 2,
    #[strum(to_string = "muon_veto")]
    MuonVeto = 3,
    #[strum(to_string = "preamp_low_energy")]
    PreampLowEnergy = 4,
    #[strum(to_string = "preamp_high_energy")]
    PreampHighEnergy = 5,
}

impl ChannelRole {
    /// Channels carrying energy information, in the order their
    /// features are stored in an [record::EventRecord].
    pub const ENERGY: [ChannelRole; 5] = [
        ChannelRole::ShapedShortLowEnergy,
        ChannelRole::ShapedLongLowEnergy,
        ChannelRole::ShapedLongHighEnergy,
        ChannelRole::PreampLowEnergy,
        ChannelRole::PreampHighEnergy,
    ];

    /// Fast unshaped channels used for timing, in output order.
    pub const PREAMP: [ChannelRole; 2] =
        [ChannelRole::PreampLowEnergy, ChannelRole::PreampHighEnergy];

    pub const VETO: ChannelRole = ChannelRole::MuonVeto;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_shaped(self) -> bool {
        matches!(
            self,
            ChannelRole::ShapedShortLowEnergy
                | ChannelRole::ShapedLongLowEnergy
                | ChannelRole::ShapedLongHighEnergy
        )
    }

    pub fn is_preamp(self) -> bool {
        matches!(
            self,
            ChannelRole::PreampLowEnergy | ChannelRole::PreampHighEnergy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn roles_match_recorded_positions() {
        for (i, role) in ChannelRole::iter().enumerate() {
            assert_eq!(role.index(), i);
        }
        assert_eq!(ChannelRole::iter().count(), CHANNELS_PER_EVENT);
    }

    #[test]
    fn energy_roles_exclude_veto() {
        assert!(!ChannelRole::ENERGY.contains(&ChannelRole::VETO));
        assert_eq!(
            ChannelRole::ENERGY
                .iter()
                .filter(|role| role.is_shaped())
                .count(),
            3
        );
        assert!(ChannelRole::PREAMP.iter().all(|role| role.is_preamp()));
    }
}
