use crate::pulse_detection::Real;
use bege_common::{
    ChannelRole, EntryIndex, SampleIndex,
    metrics::failures::FailureKind,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum FeatureError {
    #[error("Waveform is empty")]
    EmptyWaveform,
    #[error("Window at sample {start} of width {width} has no samples in a waveform of length {length}")]
    InvalidWindow {
        start: SampleIndex,
        width: usize,
        length: usize,
    },
    #[error("Waveform never reached {level} after sample {scan_from}")]
    NoCrossingFound { level: Real, scan_from: SampleIndex },
    #[error("Expected {expected} noise thresholds, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Waveform of length {length} cannot be decomposed to {levels} levels")]
    InsufficientLength { length: usize, levels: usize },
}

impl FeatureError {
    /// A fatal error is a configuration error, so every following event
    /// would fail in the same way.
    pub(crate) fn is_fatal(&self) -> bool {
        matches!(self, FeatureError::DimensionMismatch { .. })
    }

    pub(crate) fn failure_kind(&self) -> FailureKind {
        match self {
            FeatureError::EmptyWaveform => FailureKind::EmptyWaveform,
            FeatureError::InvalidWindow { .. } => FailureKind::InvalidWindow,
            FeatureError::NoCrossingFound { .. } => FailureKind::NoCrossingFound,
            FeatureError::DimensionMismatch { .. } => FailureKind::DimensionMismatch,
            FeatureError::InsufficientLength { .. } => FailureKind::InsufficientLength,
        }
    }
}

#[derive(Debug, Error)]
#[error("Event {entry}, channel {role}: {source}")]
pub(crate) struct EventError {
    pub(crate) entry: EntryIndex,
    pub(crate) role: ChannelRole,
    #[source]
    pub(crate) source: FeatureError,
}

impl EventError {
    pub(crate) fn new(entry: EntryIndex, role: ChannelRole, source: FeatureError) -> Self {
        Self {
            entry,
            role,
            source,
        }
    }

    pub(crate) fn is_fatal(&self) -> bool {
        self.source.is_fatal()
    }
}

#[derive(Debug, Error)]
pub(crate) enum SinkError {
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Serialisation Error: {0}")]
    Json(#[from] serde_json::Error),
}
