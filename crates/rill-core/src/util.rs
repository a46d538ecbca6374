//! Timing helpers.

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// RAII timer that logs elapsed time on drop.
///
/// ```ignore
/// let _t = Timed::debug("tick ×16");
/// // logs "tick ×16: 12.3ms" at DEBUG when _t is dropped
/// ```
///
/// `wasm32-unknown-unknown` has no monotonic clock, so there only the name is logged.
pub struct Timed {
    name: String,
    #[cfg(not(target_arch = "wasm32"))]
    start: Instant,
    level: log::Level,
}

impl Timed {
    /// Create a new timer that logs at INFO level.
    pub fn info(name: impl Into<String>) -> Self {
        Self::at(name.into(), log::Level::Info)
    }

    /// Create a new timer that logs at DEBUG level.
    pub fn debug(name: impl Into<String>) -> Self {
        Self::at(name.into(), log::Level::Debug)
    }

    fn at(name: String, level: log::Level) -> Self {
        log::trace!("{name}...");
        Self {
            name,
            #[cfg(not(target_arch = "wasm32"))]
            start: Instant::now(),
            level,
        }
    }
}

impl Drop for Timed {
    #[cfg(not(target_arch = "wasm32"))]
    fn drop(&mut self) {
        log::log!(self.level, "{}: {:.3?}", self.name, self.start.elapsed());
    }

    #[cfg(target_arch = "wasm32")]
    fn drop(&mut self) {
        log::log!(self.level, "{}: done", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_log_at_their_level() {
        assert_eq!(Timed::info("batch").level, log::Level::Info);
        let t = Timed::debug(String::from("reset"));
        assert_eq!((t.name.as_str(), t.level), ("reset", log::Level::Debug));
    }
}
