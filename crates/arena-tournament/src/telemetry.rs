//! Tracing setup for tournament hosts.
//!
//! The scheduler and match engine only emit `tracing` events; whoever runs
//! a tournament decides where they go. [`init_tracing`] is the stock choice.
//!
//! Substituted moves are logged by `match_logic` as `decision.fallback`
//! warnings. They are the audit trail of a run, so the default filter keeps
//! them even when the requested level is quieter.

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Target and level of the decision fallback audit events
const AUDIT_DIRECTIVE: &str = "match_logic=warn";

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise events at `level` and above are kept,
/// plus the fallback audit events. With `json`, each event is one JSON line
/// carrying its target, so audit lines can be picked out downstream.
///
/// Only the first call in a process takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().with_target(true).json())
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}

fn default_filter(level: Level) -> EnvFilter {
    let filter = EnvFilter::new(level.as_str());
    // Levels order by verbosity: only ERROR is quieter than the audit trail
    if level >= Level::WARN {
        return filter;
    }
    match AUDIT_DIRECTIVE.parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}
