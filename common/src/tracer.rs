use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

/// Initialises the stdout tracer for the calling component.
///
/// The filter is read from `RUST_LOG`, falling back to `default_level`
/// when the variable is absent or cannot be parsed.
pub struct TracerEngine;

impl TracerEngine {
    /// #Arguments
    /// * `default_level` - The level used when `RUST_LOG` does not say otherwise.
    /// #Returns
    /// An instance of TracerEngine
    pub fn new(default_level: LevelFilter) -> Self {
        let stdout_tracer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false);

        let log_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let subscriber =
            tracing_subscriber::Registry::default().with(stdout_tracer.with_filter(log_filter));

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("tracing subscriber already set: {e}");
        }

        Self
    }
}

#[macro_export]
macro_rules! init_tracer {
    ($level:expr) => {{ $crate::tracer::TracerEngine::new($level) }};
}
