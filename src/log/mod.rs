//! Logging for riskysir. The `log` crate's macros (`error!`, `warn!`, `info!`, `debug!`,
//! `trace!`) are re-exported here, and the functions below configure where their output goes.
//!
//! ```rust
//! use riskysir::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! set_log_level(LevelFilter::Debug);
//! // One line per bisection is too much.
//! set_module_filter("riskysir::solver", LevelFilter::Off);
//! ```
//!
//! Nothing is logged until a level is set. With the `logging` feature, messages are written to
//! stderr by `log4rs`; without it only the `log` crate's maximum level is updated.
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};

#[cfg(feature = "logging")]
use log4rs::Handle;
use rustc_hash::FxHashMap;
use std::sync::{LazyLock, Mutex, MutexGuard};

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The global level plus per-module overrides, keyed by module path (`"riskysir::curve"`).
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_levels: FxHashMap<String, LevelFilter>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: LevelFilter::Off,
            module_levels: FxHashMap::default(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    /// Records a module level. Returns true if anything changed.
    fn insert_module_level(&mut self, module: &str, level: LevelFilter) -> bool {
        self.module_levels.insert(module.to_string(), level) != Some(level)
    }
}

/// Turns on every message. Same as `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Turns off every message not covered by a module filter.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the level for modules without their own filter.
pub fn set_log_level(level: LevelFilter) {
    let mut configuration = log_configuration();
    configuration.global_log_level = level;
    configuration.set_config();
}

/// Sets the level for one module path and everything below it.
pub fn set_module_filter(module_path: &str, level: LevelFilter) {
    let mut configuration = log_configuration();
    if configuration.insert_module_level(module_path, level) {
        configuration.set_config();
    }
}

/// Sets several module filters, reconfiguring the logger once.
pub fn set_module_filters<'a, I>(module_filters: I)
where
    I: IntoIterator<Item = (&'a str, LevelFilter)>,
{
    let mut configuration = log_configuration();
    let mut changed = false;
    for (module_path, level) in module_filters {
        changed |= configuration.insert_module_level(module_path, level);
    }
    if changed {
        configuration.set_config();
    }
}

/// Drops the filter for a module path so the global level applies to it again.
pub fn remove_module_filter(module_path: &str) {
    let mut configuration = log_configuration();
    if configuration.module_levels.remove(module_path).is_some() {
        configuration.set_config();
    }
}

fn log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;

    // The configuration is global.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    fn reset() {
        remove_module_filter("riskysir::solver");
        remove_module_filter("riskysir::curve");
        disable_logging();
    }

    #[test]
    fn global_level_sets_max_level() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Warn);
        assert_eq!(log_configuration().global_log_level, LevelFilter::Warn);
        assert_eq!(log::max_level(), LevelFilter::Warn);

        enable_logging();
        assert_eq!(log::max_level(), LevelFilter::Trace);
        reset();
        assert_eq!(log_configuration().global_log_level, LevelFilter::Off);
    }

    #[test]
    fn module_filters_are_set_and_removed() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Info);
        set_module_filters([
            ("riskysir::solver", LevelFilter::Off),
            ("riskysir::curve", LevelFilter::Debug),
        ]);
        {
            let configuration = log_configuration();
            assert_eq!(
                configuration.module_levels.get("riskysir::solver"),
                Some(&LevelFilter::Off)
            );
            assert_eq!(
                configuration.module_levels.get("riskysir::curve"),
                Some(&LevelFilter::Debug)
            );
        }

        set_module_filter("riskysir::curve", LevelFilter::Trace);
        remove_module_filter("riskysir::solver");
        {
            let configuration = log_configuration();
            assert!(!configuration.module_levels.contains_key("riskysir::solver"));
            assert_eq!(
                configuration.module_levels.get("riskysir::curve"),
                Some(&LevelFilter::Trace)
            );
        }
        reset();
        assert!(log_configuration().module_levels.is_empty());
    }

    #[test]
    fn unchanged_filter_is_not_reported_as_a_change() {
        let mut configuration = LogConfiguration::default();
        assert!(configuration.insert_module_level("riskysir::cache", LevelFilter::Debug));
        assert!(!configuration.insert_module_level("riskysir::cache", LevelFilter::Debug));
        assert!(configuration.insert_module_level("riskysir::cache", LevelFilter::Info));
    }
}
