use crate::{
    channels::{find_channel_features, find_risetime_features},
    error::EventError,
    parameters::AnalysisParameters,
    pulse_detection::find_regions,
    sink::RecordSink,
};
use anyhow::{Context, Result};
use bege_common::{
    ChannelRole, EntryIndex,
    metrics::{
        failures::{self, FailureKind},
        names::{EVENTS_PROCESSED, EVENTS_READ, FAILURES},
    },
    record::EventRecord,
};
use metrics::counter;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use trace_reader::{EventSource, EventView, ReaderError};
use tracing::{error, info, warn};

/// Builds the record of one event from scratch.
#[tracing::instrument(skip_all, fields(entry = entry))]
pub(crate) fn process_event(
    entry: EntryIndex,
    event: &EventView,
    parameters: &AnalysisParameters,
) -> Result<EventRecord, EventError> {
    let sampling_frequency = event.sampling_frequency;
    let veto_regions =
        find_regions(event.trace(ChannelRole::VETO), parameters.veto_threshold).into();

    let [shaped_short, shaped_long, shaped_high, preamp_low, preamp_high] =
        ChannelRole::ENERGY.map(|role| {
            find_channel_features(event.trace(role), sampling_frequency, role, parameters)
                .map_err(|source| EventError::new(entry, role, source))
        });
    let [risetime_low, risetime_high] = ChannelRole::PREAMP.map(|role| {
        find_risetime_features(event.trace(role), sampling_frequency, role, parameters)
            .map_err(|source| EventError::new(entry, role, source))
    });

    Ok(EventRecord {
        entry,
        timestamp: event.timestamp,
        pulser_on: event.pulser_on(),
        veto_regions,
        channels: [
            shaped_short?,
            shaped_long?,
            shaped_high?,
            preamp_low?,
            preamp_high?,
        ],
        risetimes: [risetime_low?, risetime_high?],
    })
}

#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    /// Number of events read before each parallel analysis.
    pub(crate) batch_size: usize,
    pub(crate) max_events: Option<usize>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) read: usize,
    pub(crate) processed: usize,
    pub(crate) failed: usize,
    pub(crate) stopped: bool,
}

/// Analyses every event of `source` and appends the records to `sink` in
/// entry order. Events which fail are logged and skipped, except for
/// configuration errors which end the run. `stop` is checked between batches.
pub(crate) fn run<S: EventSource, K: RecordSink>(
    source: &mut S,
    sink: &mut K,
    parameters: &AnalysisParameters,
    options: &RunOptions,
    stop: &AtomicBool,
) -> Result<RunSummary> {
    parameters.validate()?;

    let total = options
        .max_events
        .map_or(source.entry_count(), |max| max.min(source.entry_count()));
    let batch_size = options.batch_size.max(1);
    let progress_step = (total / 10).max(1);
    let mut next_progress = progress_step;
    let mut summary = RunSummary::default();
    info!("Analysing {total} events in batches of {batch_size}");

    for batch_start in (0..total).step_by(batch_size) {
        if stop.load(Ordering::Relaxed) {
            warn!("Stop requested after {} events", summary.read);
            summary.stopped = true;
            break;
        }

        let batch_end = (batch_start + batch_size).min(total);
        let events = (batch_start..batch_end)
            .map(|entry| -> Result<_, ReaderError> {
                let event = source.entry(entry).inspect_err(|_| {
                    counter!(FAILURES, &[failures::get_label(FailureKind::ReadFailed)])
                        .increment(1);
                })?;
                counter!(EVENTS_READ).increment(1);
                Ok((entry, event))
            })
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Cannot read events {batch_start} to {batch_end}"))?;
        summary.read += events.len();

        let results: Vec<_> = events
            .par_iter()
            .map(|(entry, event)| process_event(*entry, event, parameters))
            .collect();

        for result in results {
            match result {
                Ok(record) => {
                    sink.append_record(&record)?;
                    counter!(EVENTS_PROCESSED).increment(1);
                    summary.processed += 1;
                }
                Err(event_error) if event_error.is_fatal() => {
                    error!("{event_error}");
                    return Err(event_error.into());
                }
                Err(event_error) => {
                    warn!("{event_error}");
                    counter!(
                        FAILURES,
                        &[failures::get_label(event_error.source.failure_kind())]
                    )
                    .increment(1);
                    summary.failed += 1;
                }
            }
        }

        if summary.read >= next_progress {
            info!("Analysed {} of {total} events", summary.read);
            next_progress = (summary.read / progress_step + 1) * progress_step;
        }
    }

    sink.finish()?;
    info!(
        "Processed {} events, {} failed",
        summary.processed, summary.failed
    );
    Ok(summary)
}
