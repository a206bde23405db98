use std::fs::OpenOptions;
use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize tracing for the TUI. Stdout belongs to the terminal UI, so
/// logs only go anywhere when a log file is configured (flag or
/// `TALLY_LOG_FILE`). Filtering follows `RUST_LOG`, defaulting to info.
pub fn init_tracing(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_path = log_file
        .map(|p| p.to_path_buf())
        .or_else(|| std::env::var("TALLY_LOG_FILE").ok().map(Into::into));

    let Some(path) = file_path else {
        // No sink configured; install a no-op subscriber so spans are cheap.
        tracing_subscriber::registry().with(filter).init();
        return;
    };

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true);
            tracing_subscriber::registry()
                .with(file_layer.with_filter(filter))
                .init();
        }
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", path.display(), e);
            tracing_subscriber::registry().with(filter).init();
        }
    }
}
