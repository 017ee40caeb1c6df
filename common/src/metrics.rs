use metrics::{describe_counter, describe_gauge, gauge};

pub fn component_info_metric(name: &'static str) {
    static NAME: &str = "bege_analysis_component_info";

    describe_gauge!(NAME, "Basic information about the component");

    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown");
    gauge!(NAME, "component" => name, "version" => version).set(1);
}

/// Registers descriptions for all the counters used by the analysis.
pub fn describe_metrics() {
    describe_counter!(
        names::EVENTS_READ,
        metrics::Unit::Count,
        "Number of events read from the event source"
    );
    describe_counter!(
        names::EVENTS_PROCESSED,
        metrics::Unit::Count,
        "Number of event records appended to the output"
    );
    describe_counter!(
        names::FAILURES,
        metrics::Unit::Count,
        "Number of events which failed analysis, by kind"
    );
    describe_counter!(
        names::RISETIME_FALLBACKS,
        metrics::Unit::Count,
        "Number of preamp channels whose rise time could not be measured"
    );
}

pub mod names {
    use const_format::concatcp;

    pub const METRIC_NAME_PREFIX: &str = "bege_analysis_";

    pub const EVENTS_READ: &str = concatcp!(METRIC_NAME_PREFIX, "events_read");
    pub const EVENTS_PROCESSED: &str = concatcp!(METRIC_NAME_PREFIX, "events_processed");
    pub const FAILURES: &str = concatcp!(METRIC_NAME_PREFIX, "failures");
    pub const RISETIME_FALLBACKS: &str = concatcp!(METRIC_NAME_PREFIX, "risetime_fallbacks");
}

pub mod failures {
    #[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
    pub enum FailureKind {
        EmptyWaveform,
        InvalidWindow,
        InsufficientLength,
        NoCrossingFound,
        DimensionMismatch,
        ReadFailed,
    }

    // Label building function
    pub fn get_label(failure_kind: FailureKind) -> (&'static str, &'static str) {
        (
            "failure_kind",
            match failure_kind {
                FailureKind::EmptyWaveform => "empty_waveform",
                FailureKind::InvalidWindow => "invalid_window",
                FailureKind::InsufficientLength => "insufficient_length",
                FailureKind::NoCrossingFound => "no_crossing_found",
                FailureKind::DimensionMismatch => "dimension_mismatch",
                FailureKind::ReadFailed => "read_failed",
            },
        )
    }
}

pub mod channels {
    use crate::ChannelRole;

    pub fn get_label(role: ChannelRole) -> (&'static str, String) {
        ("channel", role.to_string())
    }
}
