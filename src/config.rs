//! Editor configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;
pub const DEFAULT_HYDRATE_MAX_PAGES: usize = 64;
pub const DEFAULT_NOTICE_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    /// Maximum undo steps kept; `None` keeps everything.
    pub history_limit: Option<usize>,
    /// Upper bound on pages fetched per layer during hydration.
    pub hydrate_max_pages: usize,
    /// Maximum queued user notices; the oldest are dropped first.
    pub notice_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
            hydrate_max_pages: DEFAULT_HYDRATE_MAX_PAGES,
            notice_capacity: DEFAULT_NOTICE_CAPACITY,
        }
    }
}

impl EditorConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `FIELDPLAN_HISTORY_LIMIT`: default 100, `0` keeps unlimited history
    /// - `FIELDPLAN_HYDRATE_MAX_PAGES`: default 64
    /// - `FIELDPLAN_NOTICE_CAPACITY`: default 16
    ///
    /// Unparseable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Build config from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let history_limit = match env_parse(&lookup, "FIELDPLAN_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT) {
            0 => None,
            n => Some(n),
        };
        Self {
            history_limit,
            hydrate_max_pages: env_parse(&lookup, "FIELDPLAN_HYDRATE_MAX_PAGES", DEFAULT_HYDRATE_MAX_PAGES).max(1),
            notice_capacity: env_parse(&lookup, "FIELDPLAN_NOTICE_CAPACITY", DEFAULT_NOTICE_CAPACITY),
        }
    }
}

fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => default,
    }
}
