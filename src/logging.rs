use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level for a `-v` / `-q` count. `info` is the default.
pub fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::WARN;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

// RUST_LOG overrides the CLI level when set
fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!("warn,wingback_scout={level}"))
    })
}

/// Installs the stderr subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(verbose: u8, quiet: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(level_for(verbose, quiet)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
