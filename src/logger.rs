use std::io::IsTerminal;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over the
/// verbosity flag.
pub fn init_cli_logger(verbose: bool) {
    let default_filter = if verbose {
        "pynotes=debug"
    } else {
        "pynotes=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Keep an already installed global subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
                .without_time()
                .compact(),
        )
        .try_init();
}
