use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "warn,api=debug,services=debug,studyforge=debug";

/// Filter directive: `RUST_LOG` wins, then `--verbose`, then warnings only.
#[must_use]
pub fn filter_directive(rust_log: Option<String>, verbose: bool) -> String {
    match rust_log.filter(|value| !value.trim().is_empty()) {
        Some(value) => value,
        None if verbose => VERBOSE_FILTER.to_string(),
        None => DEFAULT_FILTER.to_string(),
    }
}

/// Install a compact stderr subscriber once per process.
pub fn init_tracing(filter: &str) {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .compact()
            .with_writer(std::io::stderr);

        let filter_layer =
            EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}
