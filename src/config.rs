use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Largest accepted request body. Base64 uploads make this the binding limit.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Shared secret the frontend must present with every request.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AccessConfig {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_gemini_api_url")]
    pub api_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_github_api_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_url: default_telegram_api_url(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_gemini_api_url(),
            model: default_gemini_model(),
            system_instruction: default_system_instruction(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_body_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    concat!("keyrelay/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_system_instruction() -> String {
    "Kamu adalah asisten AI dari \"Rendal Operasi & Niaga\". \
     Jawablah setiap pertanyaan pengguna secara bebas, santai, dan bersahabat."
        .to_string()
}

impl Config {
    /// Access code with empty values treated as unset.
    pub fn access_code(&self) -> Option<&str> {
        self.access.code.as_deref().filter(|c| !c.is_empty())
    }

    /// Load from `path` if it exists, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse `path` alone. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Overlay secrets and the listen address from `lookup`.
    /// Empty values are ignored so an exported-but-blank variable never wipes a file value.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(code) = get("ACCESS_CODE") {
            self.access.code = Some(code);
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = token;
        }
        if let Some(token) = get("TELEGRAM_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini.api_key = key;
        }
        if let Some(listen) = get("KEYRELAY_LISTEN") {
            self.server.listen = listen;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert!(config.gemini.system_instruction.contains("Rendal Operasi & Niaga"));
        assert!(config.github.user_agent.starts_with("keyrelay/"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[access]
code = "rahasia"

[github]
token = "ghp_file"

[gemini]
model = "gemini-2.0-pro"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.access_code(), Some("rahasia"));
        assert_eq!(config.github.token, "ghp_file");
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.gemini.model, "gemini-2.0-pro");
        assert_eq!(config.server.listen, "0.0.0.0:3000");
        assert_eq!(config.server.max_body_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[access\ncode = ").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        config.github.token = "from-file".to_string();

        config.apply_overrides(env(&[
            ("ACCESS_CODE", "env-code"),
            ("GITHUB_TOKEN", "from-env"),
            ("TELEGRAM_TOKEN", "123:abc"),
            ("GEMINI_API_KEY", "AIza"),
            ("KEYRELAY_LISTEN", "127.0.0.1:9000"),
        ]));

        assert_eq!(config.access_code(), Some("env-code"));
        assert_eq!(config.github.token, "from-env");
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.gemini.api_key, "AIza");
        assert_eq!(config.server.listen, "127.0.0.1:9000");
    }

    #[test]
    fn test_blank_env_does_not_override() {
        let mut config = Config::default();
        config.access.code = Some("kept".to_string());
        config.apply_overrides(env(&[("ACCESS_CODE", "")]));
        assert_eq!(config.access_code(), Some("kept"));
    }

    #[test]
    fn test_empty_access_code_is_unset() {
        let mut config = Config::default();
        assert_eq!(config.access_code(), None);
        config.access.code = Some(String::new());
        assert_eq!(config.access_code(), None);
    }
}
