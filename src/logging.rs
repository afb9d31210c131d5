use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Install the stderr subscriber. `RUST_LOG` wins over `-v` flags.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        .add_directive("hyper=off".parse().unwrap_or_else(|_| level.into()))
        .add_directive("reqwest=warn".parse().unwrap_or_else(|_| level.into()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .try_init();
}
