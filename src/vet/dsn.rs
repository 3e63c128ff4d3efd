use std::{
    collections::HashMap,
    sync::{LazyLock, OnceLock}
};

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

/// Environment variables used to expand `${VAR}` placeholders in database
/// URIs.
///
/// The process environment is read once, on first use, and reused for the
/// rest of the run. Unset variables expand to an empty string.
#[derive(Debug, Default)]
pub struct EnvSnapshot {
    vars: OnceLock<HashMap<String, String>>
}

impl EnvSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot with fixed contents instead of the process environment
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>
    {
        let map: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            vars: OnceLock::from(map)
        }
    }

    fn vars(&self) -> &HashMap<String, String> {
        self.vars.get_or_init(|| std::env::vars().collect())
    }

    /// Expand every `${VAR}` in `dsn`
    pub fn resolve(&self, dsn: &str) -> String {
        let vars = self.vars();
        PLACEHOLDER
            .replace_all(dsn, |caps: &Captures<'_>| {
                vars.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned()
    }
}
