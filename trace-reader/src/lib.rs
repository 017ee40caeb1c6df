//! Access to recorded detector events.
//!
//! An event is the set of waveforms digitised for one trigger, together with
//! the two raw pulser-indicator words and the trigger timestamp. Sources are
//! random access by entry index, so the analysis can be resumed or sampled.

pub mod loader;
pub mod memory;
pub mod simulate;

use bege_common::{CHANNELS_PER_EVENT, ChannelRole, EntryIndex, Real, Timestamp};
use thiserror::Error;

pub use loader::{RawEventFile, RawFileFormat};
pub use memory::InMemorySource;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("File size {size} is not a multiple of the event record size {record_size}")]
    CorruptFile { size: u64, record_size: u64 },
    #[error("Invalid entry index: {entry} should be less than {count}")]
    EntryOutOfRange { entry: EntryIndex, count: usize },
    #[error("Trace for {role} has {found} samples, expected {expected}")]
    TraceLength {
        role: ChannelRole,
        expected: usize,
        found: usize,
    },
}

/// One recorded event, as handed to the analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct EventView {
    /// Raw traces in volts, indexed by [ChannelRole::index].
    pub traces: [Vec<Real>; CHANNELS_PER_EVENT],
    /// Sampling frequency of every trace, in Hz.
    pub sampling_frequency: Real,
    pub pulser_chunks: [u32; 2],
    pub timestamp: Timestamp,
}

impl EventView {
    pub fn trace(&self, role: ChannelRole) -> &[Real] {
        &self.traces[role.index()]
    }

    /// True if either pulser indicator was raised for this trigger.
    pub fn pulser_on(&self) -> bool {
        self.pulser_chunks.iter().any(|&chunk| chunk != 0)
    }
}

/// An indexed, random access collection of events.
pub trait EventSource {
    fn entry_count(&self) -> usize;

    fn entry(&mut self, entry: EntryIndex) -> Result<EventView, ReaderError>;
}
