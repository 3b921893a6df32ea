//! Diagnostic logging to stderr. Console reporting lives in `cli` and does not go through here.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins; otherwise `warn`,
/// or `dmfetch=debug` when verbose.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "warn,dmfetch=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    Ok(())
}
