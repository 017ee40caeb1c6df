mod channels;
mod error;
mod parameters;
mod processing;
mod pulse_detection;
mod sink;

use anyhow::Result;
use bege_common::{
    init_tracer,
    metrics::{component_info_metric, describe_metrics},
};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use parameters::AnalysisParameters;
use processing::RunOptions;
use sink::JsonLinesSink;
use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use trace_reader::{RawEventFile, RawFileFormat};
use tracing::{info, level_filters::LevelFilter, warn};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Raw digitizer file to analyse.
    #[clap(long)]
    input: PathBuf,

    /// File the event records are written to, one JSON object per line.
    #[clap(long)]
    output: PathBuf,

    #[clap(long, default_value = "8000")]
    waveform_length: usize,

    #[clap(long, default_value = "20e6")]
    sampling_frequency: f64,

    /// Number of events read and analysed together.
    #[clap(long, default_value = "256")]
    batch_size: usize,

    /// Stop after this many events.
    #[clap(long)]
    max_events: Option<usize>,

    #[clap(long, default_value = "info")]
    log_level: LevelFilter,

    /// If set, serves prometheus metrics on this address.
    #[clap(long)]
    observability_address: Option<SocketAddr>,

    #[command(flatten)]
    analysis: AnalysisParameters,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let _tracer = init_tracer!(args.log_level);

    if let Some(address) = args.observability_address {
        PrometheusBuilder::new()
            .with_http_listener(address)
            .install()?;
        info!("Serving metrics on {address}");
    }
    component_info_metric("trace-to-features");
    describe_metrics();

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupted, finishing the current batch");
            stop.store(true, Ordering::SeqCst);
        })?;
    }

    let format = RawFileFormat {
        waveform_length: args.waveform_length,
        sampling_frequency: args.sampling_frequency,
    };
    let mut source = RawEventFile::open(&args.input, format)?;
    let mut sink = JsonLinesSink::create(&args.output)?;
    let options = RunOptions {
        batch_size: args.batch_size,
        max_events: args.max_events,
    };

    let summary = processing::run(&mut source, &mut sink, &args.analysis, &options, &stop)?;
    info!(
        "Wrote {} records to {:?}",
        sink.written(),
        args.output
    );
    if summary.stopped {
        warn!("Run was interrupted after {} events", summary.read);
    }
    Ok(())
}
