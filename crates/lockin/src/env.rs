use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

/// One place the relay can read configuration from.
#[async_trait]
pub trait EnvSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Option<String>;

    /// Key names this source exposes. Never values.
    async fn keys(&self) -> Vec<String>;
}

/// Environment of the running process.
pub struct ProcessEnv;

#[async_trait]
impl EnvSource for ProcessEnv {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    async fn keys(&self) -> Vec<String> {
        std::env::vars_os()
            .filter_map(|(k, _)| k.into_string().ok())
            .collect()
    }
}

/// Fixed key/value table, used for the platform runtime accessor and the
/// per-request context environment.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    name: &'static str,
    vars: Arc<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new(name: &'static str, vars: HashMap<String, String>) -> Self {
        Self {
            name,
            vars: Arc::new(vars),
        }
    }

    pub fn platform(vars: HashMap<String, String>) -> Self {
        Self::new("platform", vars)
    }

    pub fn context(vars: HashMap<String, String>) -> Self {
        Self::new("context", vars)
    }
}

#[async_trait]
impl EnvSource for MapEnv {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    async fn keys(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    pub source: &'static str,
}

/// Query `sources` in order and return the first non-empty value for `key`.
pub async fn resolve(sources: &[&dyn EnvSource], key: &str) -> Option<Resolved> {
    for source in sources {
        match source.get(key).await {
            Some(value) if !value.is_empty() => {
                return Some(Resolved {
                    value,
                    source: source.name(),
                })
            }
            _ => continue,
        }
    }
    None
}

/// Key names in `source` containing `needle`, sorted.
pub async fn visible_keys(source: &dyn EnvSource, needle: &str) -> Vec<String> {
    let mut keys: Vec<String> = source
        .keys()
        .await
        .into_iter()
        .filter(|k| k.contains(needle))
        .collect();
    keys.sort();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(name: &'static str, pairs: &[(&str, &str)]) -> MapEnv {
        MapEnv::new(
            name,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn first_defined_source_wins() {
        let a = map("a", &[("HOOK", "https://a")]);
        let b = map("b", &[("HOOK", "https://b")]);
        let sources: [&dyn EnvSource; 2] = [&a, &b];
        let found = resolve(&sources, "HOOK").await.unwrap();
        assert_eq!(found.value, "https://a");
        assert_eq!(found.source, "a");
    }

    #[tokio::test]
    async fn empty_and_missing_values_fall_through() {
        let empty = map("empty", &[("HOOK", "")]);
        let missing = map("missing", &[("OTHER", "x")]);
        let last = map("last", &[("HOOK", "https://last")]);
        let sources: [&dyn EnvSource; 3] = [&empty, &missing, &last];
        let found = resolve(&sources, "HOOK").await.unwrap();
        assert_eq!(found.source, "last");

        assert!(resolve(&sources[..2], "HOOK").await.is_none());
        assert!(resolve(&[], "HOOK").await.is_none());
    }

    #[tokio::test]
    async fn visible_keys_lists_names_only() {
        let src = map(
            "p",
            &[
                ("DISCORD_WEBHOOK_URL", "https://secret"),
                ("DISCORD_OTHER", "1"),
                ("PATH", "/bin"),
            ],
        );
        let keys = visible_keys(&src, "DISCORD").await;
        assert_eq!(keys, vec!["DISCORD_OTHER", "DISCORD_WEBHOOK_URL"]);
        assert!(!keys.iter().any(|k| k.contains("https://")));
    }

    #[tokio::test]
    async fn process_env_reads_real_environment() {
        let path = ProcessEnv.get("PATH").await;
        assert_eq!(path, std::env::var("PATH").ok());
        assert_eq!(ProcessEnv.name(), "process");
    }
}
