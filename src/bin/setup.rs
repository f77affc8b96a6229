//! keyrelay setup.
//!
//! Prompts for the access code, upstream credentials and listen address on the
//! terminal, then writes `config.toml` into `KEYRELAY_ROOT` (default: cwd).
//! Secrets can still be overridden at runtime through environment variables.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

struct ConfigParams<'a> {
    access_code: &'a str,
    github_token: &'a str,
    telegram_token: &'a str,
    gemini_key: &'a str,
    model: &'a str,
    listen: &'a str,
}

/// TOML basic string with quotes and backslashes escaped.
fn quoted(value: &str) -> String {
    toml::Value::String(value.to_owned()).to_string()
}

/// Render a config.toml. Empty secrets are written commented out so the
/// environment variable can supply them instead.
fn format_config(p: &ConfigParams<'_>) -> String {
    let secret = |key: &str, value: &str, env: &str| {
        if value.is_empty() {
            format!("# {key} = \"\"  # or set {env}")
        } else {
            format!("{key} = {}", quoted(value))
        }
    };

    let listen = quoted(p.listen);
    let access = secret("code", p.access_code, "ACCESS_CODE");
    let github = secret("token", p.github_token, "GITHUB_TOKEN");
    let telegram = secret("bot_token", p.telegram_token, "TELEGRAM_TOKEN");
    let gemini = secret("api_key", p.gemini_key, "GEMINI_API_KEY");
    let model = quoted(p.model);

    format!(
        r#"[server]
listen = {listen}

[access]
{access}

[github]
{github}

[telegram]
{telegram}

[gemini]
{gemini}
model = {model}
"#
    )
}

fn run_cli(project_root: &Path) -> Result<()> {
    println!("=== keyrelay setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let or_default = |s: String, default: &str| {
        if s.is_empty() {
            default.to_owned()
        } else {
            s
        }
    };

    let access_code = read_line("Access code for the frontend: ")?;
    let github_token = read_line("GitHub token (blank to use GITHUB_TOKEN): ")?;
    let telegram_token = read_line("Telegram bot token (blank to use TELEGRAM_TOKEN): ")?;
    let gemini_key = read_line("Gemini API key (blank to use GEMINI_API_KEY): ")?;
    let model = or_default(
        read_line("Gemini model [gemini-2.5-flash]: ")?,
        "gemini-2.5-flash",
    );
    let listen = or_default(read_line("Listen address [0.0.0.0:3000]: ")?, "0.0.0.0:3000");

    let config = format_config(&ConfigParams {
        access_code: &access_code,
        github_token: &github_token,
        telegram_token: &telegram_token,
        gemini_key: &gemini_key,
        model: &model,
        listen: &listen,
    });

    let config_path = project_root.join("config.toml");
    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("   Start the proxy with:  cargo run");
    Ok(())
}

fn main() -> Result<()> {
    let project_root =
        PathBuf::from(std::env::var("KEYRELAY_ROOT").unwrap_or_else(|_| ".".to_string()));
    run_cli(&project_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(access_code: &str, github_token: &str, telegram_token: &str, gemini_key: &str) -> String {
        format_config(&ConfigParams {
            access_code,
            github_token,
            telegram_token,
            gemini_key,
            model: "gemini-2.5-flash",
            listen: "0.0.0.0:3000",
        })
    }

    #[test]
    fn test_all_secrets_written() {
        let out = cfg("kode", "ghp_x", "1:abc", "AIza");
        assert!(out.contains("[access]\ncode = \"kode\""));
        assert!(out.contains("[github]\ntoken = \"ghp_x\""));
        assert!(out.contains("[telegram]\nbot_token = \"1:abc\""));
        assert!(out.contains("[gemini]\napi_key = \"AIza\""));
        assert!(out.contains("model = \"gemini-2.5-flash\""));
        assert!(out.contains("listen = \"0.0.0.0:3000\""));
    }

    #[test]
    fn test_blank_secret_commented_out() {
        let out = cfg("kode", "", "1:abc", "");
        assert!(out.contains("# token = \"\"  # or set GITHUB_TOKEN"));
        assert!(out.contains("# api_key = \"\"  # or set GEMINI_API_KEY"));
        assert!(!out.contains("\ntoken ="));
    }

    #[test]
    fn test_quotes_are_escaped() {
        let out = cfg(r#"a"b\c"#, "t", "t", "k");
        let parsed: toml::Value = toml::from_str(&out).unwrap();
        assert_eq!(parsed["access"]["code"].as_str(), Some(r#"a"b\c"#));
    }

    #[test]
    fn test_output_is_valid_toml() {
        let out = cfg("", "", "", "");
        let parsed: toml::Value = toml::from_str(&out).unwrap();
        assert_eq!(parsed["server"]["listen"].as_str(), Some("0.0.0.0:3000"));
        assert!(parsed["access"].get("code").is_none());
    }
}
