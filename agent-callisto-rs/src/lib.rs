//! agent-callisto: audio, haptic and spoken feedback for streamed terminal
//! output.
//!
//! Output chunks flow through a rolling buffer and a category matcher; a
//! cooldown gate decides whether a match becomes an announcement, and an
//! announcer plays it in the background.

pub mod announce;
pub mod config;
pub mod error;
pub mod feedback;
pub mod history;
pub mod pipeline;
pub mod playback;
pub mod service;
pub mod sounds;
pub mod transcript;

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` wins unless `verbose`.
pub fn init_logging(verbose: bool) {
    // Suppress noisy decoder/HTTP internals
    let filter = if verbose {
        EnvFilter::new("debug,symphonia=info,hyper_util=info,reqwest=info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,symphonia=warn,hyper_util=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
