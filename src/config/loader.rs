//! Configuration loading from disk, environment and command line.
//!
//! Precedence, lowest first: built-in defaults, TOML file, environment
//! variables, command-line overrides. Validation runs once on the result.

use std::fs;
use std::path::Path;

use crate::config::schema::EdgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values given on the command line; `None` keeps the lower layer's value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub threads: Option<usize>,
    pub root: Option<String>,
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the effective configuration from every layer.
///
/// `env` looks up an environment variable; pass `|k| std::env::var(k).ok()`
/// in production.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<EdgeConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => EdgeConfig::default(),
    };

    apply_env_overrides(&mut config, env).map_err(ConfigError::Validation)?;
    apply_overrides(&mut config, overrides);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: EdgeConfig = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "Configuration file read");
    Ok(config)
}

/// Apply `PORT`, `APIDB_*` and `PUBSUB_CHANNEL`.
pub fn apply_env_overrides(
    config: &mut EdgeConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(value) = env("PORT") {
        match value.trim().parse::<u16>() {
            Ok(port) => config.listener.bind_address = with_port(&config.listener.bind_address, port),
            Err(_) => errors.push(env_error("PORT", &value)),
        }
    }

    if let Some(name) = env("APIDB_NAME") {
        config.database.name = name;
    }
    if let Some(user) = env("APIDB_USER") {
        config.database.user = user;
    }
    if let Some(password) = env("APIDB_PASSWORD") {
        config.database.password = password;
    }
    if let Some(host) = env("APIDB_HOST") {
        config.database.host = host;
    }
    if let Some(value) = env("APIDB_PORT") {
        match value.trim().parse::<u16>() {
            Ok(port) => config.database.port = port,
            Err(_) => errors.push(env_error("APIDB_PORT", &value)),
        }
    }

    if let Some(channel) = env("PUBSUB_CHANNEL") {
        config.pubsub.channel = channel;
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Apply command-line overrides.
pub fn apply_overrides(config: &mut EdgeConfig, overrides: &ConfigOverrides) {
    if let Some(address) = &overrides.address {
        config.listener.bind_address = with_host(&config.listener.bind_address, address);
    }
    if let Some(port) = overrides.port {
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
    }
    if let Some(threads) = overrides.threads {
        config.listener.worker_threads = threads;
    }
    if let Some(root) = &overrides.root {
        config.static_files.doc_root = root.clone();
    }
}

fn env_error(var: &str, value: &str) -> ValidationError {
    ValidationError {
        field: var.to_string(),
        message: format!("'{value}' is not a valid port"),
    }
}

fn split_bind(bind: &str) -> (&str, &str) {
    bind.rsplit_once(':').unwrap_or((bind, ""))
}

fn with_port(bind: &str, port: u16) -> String {
    let (host, _) = split_bind(bind);
    format!("{host}:{port}")
}

fn with_host(bind: &str, host: &str) -> String {
    let (_, port) = split_bind(bind);
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EdgeConfig::default();
        apply_env_overrides(
            &mut config,
            env_from(&[
                ("PORT", "8080"),
                ("APIDB_NAME", "posts"),
                ("APIDB_HOST", "db"),
                ("APIDB_PORT", "6543"),
                ("PUBSUB_CHANNEL", "events"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.database.name, "posts");
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.pubsub.channel, "events");
    }

    #[test]
    fn test_bad_env_port_reported() {
        let mut config = EdgeConfig::default();
        let errors =
            apply_env_overrides(&mut config, env_from(&[("PORT", "99999"), ("APIDB_PORT", "x")]))
                .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "PORT");
        assert_eq!(errors[1].field, "APIDB_PORT");
    }

    #[test]
    fn test_cli_beats_env() {
        let overrides = ConfigOverrides {
            address: Some("127.0.0.1".into()),
            port: Some(4000),
            threads: Some(4),
            root: Some("public".into()),
        };
        let config = resolve_config(None, &overrides, env_from(&[("PORT", "8080")])).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        assert_eq!(config.listener.worker_threads, 4);
        assert_eq!(config.static_files.doc_root, "public");
    }

    #[test]
    fn test_ipv6_host_override() {
        assert_eq!(with_host("0.0.0.0:3011", "::1"), "[::1]:3011");
        assert_eq!(with_port("[::1]:3011", 80), "[::1]:80");
    }

    #[test]
    fn test_resolve_validates() {
        let overrides = ConfigOverrides {
            threads: Some(0),
            ..Default::default()
        };
        let err = resolve_config(None, &overrides, |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e[0].field == "listener.worker_threads"));
        assert!(err.to_string().starts_with("Validation failed: listener.worker_threads"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/edge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
