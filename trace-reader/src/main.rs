use anyhow::Result;
use bege_common::{ChannelRole, init_tracer};
use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::path::PathBuf;
use trace_reader::{
    EventSource, RawEventFile, RawFileFormat,
    loader::write_raw_file,
    simulate::{EventSimulator, Pulse},
};
use tracing::{info, level_filters::LevelFilter};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(long, default_value = "8000")]
    waveform_length: usize,

    #[clap(long, default_value = "20e6")]
    sampling_frequency: f64,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Prints the number of events and a summary of the first few.
    Info {
        #[clap(long)]
        file_name: PathBuf,

        #[clap(long, default_value = "5")]
        number_of_events: usize,
    },
    /// Writes a raw file of synthetic events.
    Simulate {
        #[clap(long)]
        file_name: PathBuf,

        #[clap(long, default_value = "100")]
        number_of_events: usize,

        #[clap(long, default_value = "0.002")]
        noise_sd: f64,

        #[clap(long, default_value = "0")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let _tracer = init_tracer!(LevelFilter::INFO);

    let args = Cli::parse();
    let format = RawFileFormat {
        waveform_length: args.waveform_length,
        sampling_frequency: args.sampling_frequency,
    };

    match args.mode {
        Mode::Info {
            file_name,
            number_of_events,
        } => {
            let mut file = RawEventFile::open(&file_name, format)?;
            info!("{} events", file.entry_count());
            for entry in 0..number_of_events.min(file.entry_count()) {
                let event = file.entry(entry)?;
                let veto_min = event
                    .trace(ChannelRole::MuonVeto)
                    .iter()
                    .copied()
                    .fold(f64::INFINITY, f64::min);
                info!(
                    "entry {entry}: timestamp {}, pulser {:?}, veto minimum {veto_min}",
                    event.timestamp, event.pulser_chunks
                );
            }
        }
        Mode::Simulate {
            file_name,
            number_of_events,
            noise_sd,
            seed,
        } => {
            let mut rng = StdRng::seed_from_u64(seed);
            let simulator =
                EventSimulator::new(format.waveform_length, format.sampling_frequency, noise_sd);
            let events: Vec<_> = (0..number_of_events)
                .map(|i| {
                    let energy = rng.random_range(0.01..0.1);
                    let peak = format.waveform_length / 2 + rng.random_range(0..200);
                    let mut pulses = simulator.typical_pulses(energy, peak);
                    if rng.random_bool(0.05) {
                        let latest = format.waveform_length.saturating_sub(50).max(1);
                        let start = rng.random_range(0..latest);
                        pulses[ChannelRole::MuonVeto.index()].push(Pulse::Flat {
                            start,
                            stop: start + 50,
                            amplitude: -0.5,
                        });
                    }
                    let pulser_chunks = [u32::from(rng.random_bool(0.01)), 0];
                    simulator.event(&mut rng, &pulses, pulser_chunks, 10_000_000 * i as u64)
                })
                .collect();
            let written = write_raw_file(&file_name, &events, &format)?;
            info!("Wrote {written} events to {file_name:?}");
        }
    }
    Ok(())
}
