use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::gemini::DEFAULT_BASE_URL;
use crate::render::OutputMode;

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";
const SECRETS_ENV: &str = "ADVISOR_SECRETS";
const DEFAULT_SECRETS_PATH: &str = "secrets.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileConfig {
    pub model: Option<String>,
    pub template: Option<PathBuf>,
    pub library: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
}

#[derive(Debug, Deserialize, Default)]
struct SecretsFile {
    #[serde(rename = "GOOGLE_API_KEY")]
    google_api_key: Option<String>,
}

pub fn load_profile(name: &str) -> Result<ProfileConfig, String> {
    let path = config_path()?;
    let profiles = read_profiles(&path)?;

    profiles.get(name).cloned().ok_or_else(|| {
        format!(
            "Profile '{}' not found in config file '{}'.",
            name,
            path.display()
        )
    })
}

/// Parses the config file and checks the named profile, or all of them.
pub fn validate_config(profile: Option<&str>) -> Result<PathBuf, String> {
    let path = config_path()?;
    let profiles = read_profiles(&path)?;

    match profile {
        Some(name) => {
            let config = profiles.get(name).ok_or_else(|| {
                format!(
                    "Profile '{}' not found in config file '{}'.",
                    name,
                    path.display()
                )
            })?;
            validate_profile(name, config)?;
        }
        None => {
            let mut names: Vec<_> = profiles.keys().collect();
            names.sort();
            for name in names {
                validate_profile(name, &profiles[name])?;
            }
        }
    }

    Ok(path)
}

fn validate_profile(name: &str, profile: &ProfileConfig) -> Result<(), String> {
    if let Some(output) = &profile.output {
        OutputMode::parse(output).map_err(|err| format!("Profile '{name}': {err}"))?;
    }
    if profile.timeout == Some(0) {
        return Err(format!("Profile '{name}': timeout must be greater than 0."));
    }
    if profile
        .model
        .as_deref()
        .is_some_and(|model| model.trim().is_empty())
    {
        return Err(format!("Profile '{name}': model must not be empty."));
    }
    Ok(())
}

fn read_profiles(path: &Path) -> Result<HashMap<String, ProfileConfig>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read config file '{}': {err}", path.display()))?;
    parse_profiles(&raw, path)
}

fn parse_profiles(raw: &str, path: &Path) -> Result<HashMap<String, ProfileConfig>, String> {
    let config: ConfigFile = toml::from_str(raw)
        .map_err(|err| format!("Failed to parse config file '{}': {err}", path.display()))?;

    config.profiles.ok_or_else(|| {
        format!(
            "Config file '{}' does not contain a [profiles] section.",
            path.display()
        )
    })
}

fn config_path() -> Result<PathBuf, String> {
    if let Some(path) = env_value("ADVISOR_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    if let Some(xdg) = env_value("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("advisor").join("config.toml"));
    }

    let home = env_value("HOME").ok_or_else(|| {
        "Cannot resolve config path: set ADVISOR_CONFIG or HOME/XDG_CONFIG_HOME.".to_string()
    })?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("advisor")
        .join("config.toml"))
}

/// Trimmed value of an environment variable, `None` when unset or blank.
pub fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Looks up the API key in the environment, then in the secrets file.
pub fn resolve_api_key() -> Option<String> {
    if let Some(key) = env_value(API_KEY_ENV) {
        return Some(key);
    }

    let path = env_value(SECRETS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRETS_PATH));
    let raw = fs::read_to_string(&path).ok()?;
    match parse_secrets(&raw) {
        Ok(key) => key,
        Err(err) => {
            warn!(path = %path.display(), "ignoring unreadable secrets file: {err}");
            None
        }
    }
}

fn parse_secrets(raw: &str) -> Result<Option<String>, toml::de::Error> {
    let secrets: SecretsFile = toml::from_str(raw)?;
    Ok(secrets
        .google_api_key
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty()))
}

/// Like [`resolve_api_key`], with the message shown when no key is found.
pub fn require_api_key() -> Result<String, String> {
    resolve_api_key().ok_or_else(missing_key_message)
}

pub fn missing_key_message() -> String {
    format!("{API_KEY_ENV} is not configured. Set it in the environment or in secrets.toml.")
}

pub fn gemini_base_url() -> String {
    env_value(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_parse_with_paths_and_timeout() {
        let profiles = parse_profiles(
            "[profiles.work]\nmodel = \"gemini-2.5-pro\"\nlibrary = \"/srv/biblioteca.json\"\ntimeout = 90\n",
            Path::new("config.toml"),
        )
        .unwrap();
        let work = &profiles["work"];
        assert_eq!(work.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(work.library.as_deref(), Some(Path::new("/srv/biblioteca.json")));
        assert_eq!(work.timeout, Some(90));
        assert_eq!(work.template, None);
    }

    #[test]
    fn missing_profiles_section_is_reported() {
        let err = parse_profiles("title = \"x\"\n", Path::new("c.toml")).unwrap_err();
        assert!(err.contains("does not contain a [profiles] section"));
    }

    #[test]
    fn profile_validation_rejects_bad_values() {
        let bad_output = ProfileConfig {
            output: Some("yaml".to_string()),
            ..Default::default()
        };
        assert!(validate_profile("p", &bad_output).is_err());

        let zero_timeout = ProfileConfig {
            timeout: Some(0),
            ..Default::default()
        };
        assert!(validate_profile("p", &zero_timeout).is_err());

        let good = ProfileConfig {
            output: Some("json".to_string()),
            timeout: Some(30),
            ..Default::default()
        };
        assert!(validate_profile("p", &good).is_ok());
    }

    #[test]
    fn missing_key_message_names_both_sources() {
        let message = missing_key_message();
        assert!(message.starts_with("GOOGLE_API_KEY is not configured"));
        assert!(message.contains("secrets.toml"));
    }

    #[test]
    fn secrets_file_key_is_trimmed() {
        assert_eq!(
            parse_secrets("GOOGLE_API_KEY = \" abc \"\n").unwrap().as_deref(),
            Some("abc")
        );
        assert_eq!(parse_secrets("GOOGLE_API_KEY = \"\"\n").unwrap(), None);
        assert_eq!(parse_secrets("OTHER = 1\n").unwrap(), None);
        assert!(parse_secrets("GOOGLE_API_KEY = ").is_err());
    }
}
