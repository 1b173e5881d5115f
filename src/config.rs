use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Config files probed, in order, when `CONFIG_PATH` is not set.
const DEFAULT_CONFIG_FILES: &[&str] = &["conf.yaml", "conf.yml", "conf.json"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    /// Return raw provider error text to clients instead of a generic message.
    #[serde(default)]
    pub expose_error_details: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Outbound request timeout. Unset means the call is awaited to completion.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Build the runtime configuration from an optional config file and the
    /// process environment.
    pub fn from_env() -> Result<Self> {
        let lookup = |name: &str| std::env::var(name).ok();

        let mut config = match discover_config_file(lookup, Path::new(".")) {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::load(&path, lookup)?
            }
            None => {
                tracing::debug!("No config file found, using defaults and environment");
                Self::default()
            }
        };

        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML or JSON config file, substituting `${VAR}` placeholders
    /// through `lookup`.
    pub fn load(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        let content = substitute_vars(&content, lookup)?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Environment variables take precedence over the config file.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.model.api_key = key;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.model.model = model;
        }
        if let Some(base_url) = lookup("GEMINI_BASE_URL") {
            self.model.base_url = base_url;
        }
        // Blank HOST/PORT count as unset.
        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            self.server.host = host.trim().to_string();
        }
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {:?}", port))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.api_key.trim().is_empty() {
            bail!("GEMINI_API_KEY is not set");
        }
        if self.model.model.trim().is_empty() {
            bail!("Model identifier must not be empty");
        }
        Ok(())
    }
}

/// `CONFIG_PATH` wins; otherwise the first default file present in `dir`.
fn discover_config_file(
    lookup: impl Fn(&str) -> Option<String>,
    dir: &Path,
) -> Option<PathBuf> {
    if let Some(path) = lookup("CONFIG_PATH").filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(path));
    }
    DEFAULT_CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Replace `${VAR_NAME}` with the variable's value. Unknown variables are left as-is.
fn substitute_vars(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &regex::Captures| {
        lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });
    Ok(replaced.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_service_contract() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.model.model, "gemini-2.5-flash");
        assert!(config.model.timeout_secs.is_none());
        assert!(!config.expose_error_details);
    }

    #[test]
    fn env_overrides_take_precedence() {
        let vars = env(&[("GEMINI_API_KEY", "secret"), ("PORT", "8080")]);
        let mut config = Config::default();
        config
            .apply_env_overrides(|k| vars.get(k).cloned())
            .unwrap();

        assert_eq!(config.model.api_key, "secret");
        assert_eq!(config.server.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_port_and_host_keep_defaults() {
        let vars = env(&[("PORT", ""), ("HOST", "   ")]);
        let mut config = Config::default();
        config
            .apply_env_overrides(|k| vars.get(k).cloned())
            .unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn model_and_host_overrides_apply() {
        let vars = env(&[
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_BASE_URL", "http://localhost:9999"),
            ("HOST", "127.0.0.1"),
        ]);
        let mut config = Config::default();
        config
            .apply_env_overrides(|k| vars.get(k).cloned())
            .unwrap();

        assert_eq!(config.model.model, "gemini-2.0-flash");
        assert_eq!(config.model.base_url, "http://localhost:9999");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn config_path_takes_precedence_over_default_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("conf.json"), "{}").unwrap();

        let vars = env(&[("CONFIG_PATH", "/etc/blackbox/custom.yaml")]);
        let found = discover_config_file(|k| vars.get(k).cloned(), dir.path());
        assert_eq!(found, Some(PathBuf::from("/etc/blackbox/custom.yaml")));
    }

    #[test]
    fn default_files_are_probed_in_order() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(discover_config_file(|_| None, dir.path()), None);

        std::fs::write(dir.path().join("conf.json"), "{}").unwrap();
        assert_eq!(
            discover_config_file(|_| None, dir.path()),
            Some(dir.path().join("conf.json"))
        );

        std::fs::write(dir.path().join("conf.yaml"), "{}").unwrap();
        assert_eq!(
            discover_config_file(|_| None, dir.path()),
            Some(dir.path().join("conf.yaml"))
        );
    }

    #[test]
    fn invalid_port_is_rejected() {
        let vars = env(&[("PORT", "not-a-port")]);
        let mut config = Config::default();
        assert!(config.apply_env_overrides(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn missing_api_key_fails_validation() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn substitutes_known_vars_only() {
        let vars = env(&[("KEY", "abc")]);
        let out = substitute_vars("a: ${KEY}\nb: ${UNSET}", |k| vars.get(k).cloned()).unwrap();
        assert_eq!(out, "a: abc\nb: ${UNSET}");
    }

    #[test]
    fn loads_yaml_with_placeholders() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "server:\n  port: 6001\nmodel:\n  api_key: ${{TEST_KEY}}\n  timeout_secs: 30\nexpose_error_details: true"
        )
        .unwrap();

        let vars = env(&[("TEST_KEY", "from-env")]);
        let config = Config::load(file.path(), |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.server.port, 6001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.model.api_key, "from-env");
        assert_eq!(config.model.timeout_secs, Some(30));
        assert_eq!(config.model.model, "gemini-2.5-flash");
        assert!(config.expose_error_details);
    }

    #[test]
    fn quoted_placeholder_survives_yaml_metacharacters() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "model:\n  api_key: \"${{TEST_KEY}}\"").unwrap();

        let vars = env(&[("TEST_KEY", "ab: cd #ef")]);
        let config = Config::load(file.path(), |k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.model.api_key, "ab: cd #ef");
    }

    #[test]
    fn loads_json_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"model": {{"api_key": "k", "model": "gemini-2.0-flash"}}}}"#
        )
        .unwrap();

        let config = Config::load(file.path(), |_| None).unwrap();
        assert_eq!(config.model.model, "gemini-2.0-flash");
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let mut config = Config::default();
        config.model.api_key = "super-secret".to_string();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
    }
}
