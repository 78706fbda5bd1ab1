// Logging setup and the per-component logger handle

use std::sync::Arc;

/// Cheap, cloneable handle naming the log target of one component.
///
/// Components receive it through their constructor and log with
/// `log::info!(target: logger.target(), ...)`, so the output of several
/// routers in one process (as in the tests) stays distinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    target: Arc<str>,
}

impl Logger {
    pub fn new(router_id: &str) -> Self {
        Self {
            target: Arc::from(format!("dive::{}", router_id)),
        }
    }

    /// Handle for a sub-component, e.g. `dive::R1::client`.
    pub fn child(&self, component: &str) -> Self {
        Self {
            target: Arc::from(format!("{}::{}", self.target, component)),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Initializes `env_logger`. `RUST_LOG` takes precedence over `verbose`.
pub fn init_logger(verbose: bool) {
    let default_level = if verbose { "trace" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    // a second init (tests, embedding) is harmless
    let _ = env_logger::Builder::from_env(env).try_init();
}
