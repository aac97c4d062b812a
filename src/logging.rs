use tracing_subscriber::EnvFilter;

/// Initialize tracing with environment-based filtering.
///
/// `RUST_LOG` wins when set; otherwise debug builds log at info and
/// release builds at warn.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("pallet_terminal=info,reqwest=warn")
        } else {
            EnvFilter::new("pallet_terminal=warn,reqwest=error")
        }
    });

    let json = std::env::var("PALLET_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // The terminal owns stdout, logs go to stderr
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}
