use crate::error::ConfigError;

pub const ENV_APP_ID: &str = "PUSHER_APP_ID";
pub const ENV_KEY: &str = "PUSHER_KEY";
pub const ENV_SECRET: &str = "PUSHER_SECRET";
pub const ENV_CLUSTER: &str = "PUSHER_CLUSTER";
pub const ENV_HOST: &str = "PUSHER_HOST";
pub const ENV_USE_TLS: &str = "PUSHER_USE_TLS";

/// Credentials and endpoint settings for one Pusher Channels app.
///
/// The four credential fields are required and must be nonempty; an empty
/// environment value is treated the same as an unset one. `host` and
/// `use_tls` mirror the SDK options of the same names and exist for tests
/// and self-hosted endpoints; production use leaves them at their defaults
/// (cluster-derived host, TLS on).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app_id: String,
    pub key: String,
    pub secret: String,
    pub cluster: String,
    pub host: Option<String>,
    pub use_tls: bool,
}

impl ClientConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an injected lookup function.
    ///
    /// The error enumerates every missing required name, in the canonical
    /// order `PUSHER_APP_ID, PUSHER_KEY, PUSHER_SECRET, PUSHER_CLUSTER`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut required = |name: &str| -> String {
            match lookup(name).filter(|value| !value.is_empty()) {
                Some(value) => value,
                None => {
                    missing.push(name.to_string());
                    String::new()
                }
            }
        };

        let app_id = required(ENV_APP_ID);
        let key = required(ENV_KEY);
        let secret = required(ENV_SECRET);
        let cluster = required(ENV_CLUSTER);

        if !missing.is_empty() {
            return Err(ConfigError::MissingVars { missing });
        }

        let host = lookup(ENV_HOST).filter(|value| !value.is_empty());
        let use_tls = lookup(ENV_USE_TLS)
            .map(|value| !matches!(value.trim(), "false" | "0"))
            .unwrap_or(true);

        Ok(Self {
            app_id,
            key,
            secret,
            cluster,
            host,
            use_tls,
        })
    }

    /// Scheme and authority of the REST endpoint, without a trailing slash.
    pub(crate) fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        match &self.host {
            Some(host) => format!("{scheme}://{host}"),
            None => format!("{scheme}://api-{}.pusher.com", self.cluster),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_APP_ID, "123456"),
            (ENV_KEY, "test-key"),
            (ENV_SECRET, "test-secret"),
            (ENV_CLUSTER, "us2"),
        ]
    }

    #[test]
    fn reads_all_required_values() {
        let config = ClientConfig::from_lookup(lookup_from(&full_env())).unwrap();
        assert_eq!(config.app_id, "123456");
        assert_eq!(config.key, "test-key");
        assert_eq!(config.secret, "test-secret");
        assert_eq!(config.cluster, "us2");
        assert_eq!(config.host, None);
        assert!(config.use_tls);
    }

    #[test]
    fn enumerates_all_missing_names_in_canonical_order() {
        let err = ClientConfig::from_lookup(|_| None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required environment variables: PUSHER_APP_ID, PUSHER_KEY, \
             PUSHER_SECRET, PUSHER_CLUSTER. Set these in your MCP server \
             configuration or .env file."
        );
    }

    #[test]
    fn enumerates_only_the_missing_subset() {
        let env = vec![(ENV_KEY, "test-key"), (ENV_CLUSTER, "us2")];
        let err = ClientConfig::from_lookup(lookup_from(&env)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("PUSHER_APP_ID, PUSHER_SECRET"));
        assert!(!message.contains("PUSHER_KEY"));
        assert!(!message.contains("PUSHER_CLUSTER"));
    }

    #[test]
    fn single_missing_name() {
        let env = vec![
            (ENV_APP_ID, "123456"),
            (ENV_KEY, "test-key"),
            (ENV_CLUSTER, "us2"),
        ];
        let err = ClientConfig::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(err
            .to_string()
            .contains("Missing required environment variables: PUSHER_SECRET."));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut env = full_env();
        env.retain(|(name, _)| *name != ENV_SECRET);
        env.push((ENV_SECRET, ""));
        let err = ClientConfig::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(err.to_string().contains("PUSHER_SECRET"));
    }

    #[test]
    fn optional_host_and_tls_overrides() {
        let mut env = full_env();
        env.push((ENV_HOST, "127.0.0.1:8080"));
        env.push((ENV_USE_TLS, "false"));
        let config = ClientConfig::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(config.host.as_deref(), Some("127.0.0.1:8080"));
        assert!(!config.use_tls);
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn tls_zero_disables_and_other_values_keep_default() {
        let mut env = full_env();
        env.push((ENV_USE_TLS, "0"));
        let config = ClientConfig::from_lookup(lookup_from(&env)).unwrap();
        assert!(!config.use_tls);

        let mut env = full_env();
        env.push((ENV_USE_TLS, "true"));
        let config = ClientConfig::from_lookup(lookup_from(&env)).unwrap();
        assert!(config.use_tls);
    }

    #[test]
    fn default_base_url_derives_from_cluster() {
        let config = ClientConfig::from_lookup(lookup_from(&full_env())).unwrap();
        assert_eq!(config.base_url(), "https://api-us2.pusher.com");
    }
}
