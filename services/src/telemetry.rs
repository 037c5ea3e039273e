use crate::config::Env;
use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over the built-in filter. `verbose` raises the built-in
/// filter to debug for every crate.
pub fn init_tracing(env: &Env, verbose: bool) -> anyhow::Result<()> {
    let default_filter = if verbose {
        "debug"
    } else {
        "info,useradmin_services=debug"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if matches!(env, Env::Prod) {
        // Production: JSON lines on stderr
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .context("failed to install the JSON tracing subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("failed to install the tracing subscriber")?;
    }

    Ok(())
}
