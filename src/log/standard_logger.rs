use log4rs::append::console::ConsoleAppender;
use log4rs::config::runtime::ConfigBuilder;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::log::LogConfiguration;

// ISO 8601 timestamp and a color coded level tag
const DEFAULT_LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";

impl LogConfiguration {
    /// Rebuilds the log4rs configuration and installs it, initializing the logger on first use.
    pub(in crate::log) fn set_config(&mut self) {
        let encoder = Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN));
        // Log output goes to stderr so that CSV written to stdout stays clean.
        let stderr: ConsoleAppender = ConsoleAppender::builder()
            .encoder(encoder)
            .target(log4rs::append::console::Target::Stderr)
            .build();
        let mut config: ConfigBuilder =
            Config::builder().appender(Appender::builder().build("stderr", Box::new(stderr)));

        for (module, level) in &self.module_levels {
            config = config.logger(Logger::builder().build(module.clone(), *level));
        }

        // The `Root` determines the global log level
        let root = Root::builder()
            .appender("stderr")
            .build(self.global_log_level);
        let new_config = match config.build(root) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to build logger config: {e}");
                return;
            }
        };

        match self.root_handle {
            Some(ref mut handle) => {
                // The global logger has already been initialized
                handle.set_config(new_config);
            }

            None => {
                // The global logger has not yet been initialized. Another logger may already be
                // installed by the host program, in which case ours stays inactive.
                match log4rs::init_config(new_config) {
                    Ok(handle) => self.root_handle = Some(handle),
                    Err(e) => eprintln!("failed to install logger: {e}"),
                }
            }
        }
    }
}
