//! Backend used without the `logging` feature: no output, only the `log` crate's level gate.

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
