//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early (or rely on lazy Once).
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Once;

use crate::error::{SeedError, SeedResult};

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        crate::env_boot::ensure_dotenv();
    });
}

type LookupFn = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Key/value source for configuration: the process environment in
/// production, a fixed map in tests.
pub struct EnvSource {
    lookup: LookupFn,
}

impl EnvSource {
    pub fn process() -> Self {
        init_env();
        Self {
            lookup: Box::new(|key| std::env::var(key).ok()),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            lookup: Box::new(move |key| map.get(key).cloned()),
        }
    }

    /// Optional value (None if unset or blank).
    pub fn opt(&self, key: &str) -> Option<String> {
        match (self.lookup)(key) {
            Some(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
            _ => None,
        }
    }

    /// Required value; the first key present wins.
    pub fn req(&self, keys: &[&'static str]) -> SeedResult<String> {
        keys.iter()
            .find_map(|k| self.opt(k))
            .ok_or(SeedError::MissingConfig(keys.first().copied().unwrap_or("")))
    }

    /// Parsed value with default fallback when unset; a value that does not
    /// parse is a configuration error.
    pub fn parse<T>(&self, key: &str, default: T) -> SeedResult<T>
    where
        T: FromStr,
    {
        match self.opt(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|_| SeedError::InvalidConfig(format!("{key}={raw:?} does not parse"))),
            None => Ok(default),
        }
    }

    /// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        match self.opt(key) {
            Some(raw) => {
                let v = raw.to_ascii_lowercase();
                matches!(v.as_str(), "1" | "true" | "on" | "yes")
            }
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn getters_read_from_pairs() {
        let env = EnvSource::from_pairs([
            ("A", " x "),
            ("BLANK", "  "),
            ("N", "42"),
            ("BAD", "forty"),
            ("F", "On"),
        ]);
        assert_eq!(env.opt("A").as_deref(), Some("x"));
        assert_eq!(env.opt("BLANK"), None);
        assert_eq!(env.parse("N", 0u32).unwrap(), 42);
        assert_eq!(env.parse("MISSING", 7u32).unwrap(), 7);
        assert!(matches!(env.parse("BAD", 0u32), Err(SeedError::InvalidConfig(_))));
        assert!(env.flag("F", false));
        assert!(env.flag("MISSING", true));
    }

    #[test]
    fn req_tries_aliases_in_order() {
        let env = EnvSource::from_pairs([("DATABASE_DSN", "postgres://b")]);
        assert_eq!(env.req(&["DATABASE_URL", "DATABASE_DSN"]).unwrap(), "postgres://b");
        match env.req(&["CFBD_API_KEY"]) {
            Err(SeedError::MissingConfig(k)) => assert_eq!(k, "CFBD_API_KEY"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
