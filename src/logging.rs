use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install the global subscriber. Output goes to stderr so it never mixes
/// with command output. Later calls are no-ops.
pub(crate) fn init(filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init("spendcast=debug");
        init("not a [valid filter");
        tracing::debug!("logging initialised");
    }
}
