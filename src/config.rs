//! Application-level configuration loading: password policy, handle generation, sessions,
//! leaderboard sizing, bot opponents and account defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::Language;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ARCADE_BACK_CONFIG_PATH";

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);
/// Upper bound applied to `session_ttl_secs`.
const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;
const DEFAULT_LEADERBOARD_SIZE: usize = 10;
const DEFAULT_DESCRIPTION: &str = "Enter your description here...";
const DEFAULT_IMAGE: &str = "images/default-avatar.jpg";

/// Rules applied to every new password.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub reject_numeric: bool,
    /// Lowercased passwords refused outright.
    pub common_passwords: Vec<String>,
    /// Similarity ratio in `0.0..=1.0` above which a password is too close to the
    /// username or email. `None` disables the check.
    pub max_similarity: Option<f64>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            reject_numeric: true,
            common_passwords: default_common_passwords(),
            max_similarity: Some(0.7),
        }
    }
}

/// Range the numeric handle suffix is drawn from, and how often to redraw.
#[derive(Debug, Clone, Copy)]
pub struct HandleSuffixConfig {
    pub min: u16,
    pub max: u16,
    pub max_attempts: u32,
}

impl Default for HandleSuffixConfig {
    fn default() -> Self {
        Self {
            min: 10,
            max: 9999,
            max_attempts: 64,
        }
    }
}

/// Values given to freshly created accounts.
#[derive(Debug, Clone)]
pub struct AccountDefaults {
    pub description: String,
    pub image: String,
    pub language: Language,
}

impl Default for AccountDefaults {
    fn default() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.into(),
            image: DEFAULT_IMAGE.into(),
            language: Language::En,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub password_policy: PasswordPolicy,
    pub handle_suffix: HandleSuffixConfig,
    pub session_ttl: Duration,
    pub leaderboard_size: usize,
    /// Opponent identifiers that denote a bot instead of a registered player.
    pub bot_names: Vec<String>,
    pub account_defaults: AccountDefaults,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        leaderboard_size = app_config.leaderboard_size,
                        bots = app_config.bot_names.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Whether `uid` names a configured bot opponent.
    pub fn is_bot(&self, uid: &str) -> bool {
        self.bot_names.iter().any(|bot| bot == uid)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            password_policy: PasswordPolicy::default(),
            handle_suffix: HandleSuffixConfig::default(),
            session_ttl: DEFAULT_SESSION_TTL,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            bot_names: vec!["AM".into()],
            account_defaults: AccountDefaults::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
///
/// Every key is optional; missing keys keep their built-in value.
struct RawConfig {
    password: RawPasswordPolicy,
    handle_suffix: RawHandleSuffix,
    session_ttl_secs: Option<u64>,
    leaderboard_size: Option<usize>,
    bot_names: Option<Vec<String>>,
    account_defaults: RawAccountDefaults,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPasswordPolicy {
    min_length: Option<usize>,
    reject_numeric: Option<bool>,
    common_passwords: Option<Vec<String>>,
    max_similarity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHandleSuffix {
    min: Option<u16>,
    max: Option<u16>,
    max_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAccountDefaults {
    description: Option<String>,
    image: Option<String>,
    language: Option<Language>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();

        let password_policy = PasswordPolicy {
            min_length: value
                .password
                .min_length
                .unwrap_or(defaults.password_policy.min_length),
            reject_numeric: value
                .password
                .reject_numeric
                .unwrap_or(defaults.password_policy.reject_numeric),
            common_passwords: value
                .password
                .common_passwords
                .map(|list| list.into_iter().map(|p| p.to_lowercase()).collect())
                .unwrap_or(defaults.password_policy.common_passwords),
            max_similarity: value
                .password
                .max_similarity
                .filter(|ratio| (0.0..=1.0).contains(ratio))
                .or(defaults.password_policy.max_similarity),
        };

        let mut handle_suffix = HandleSuffixConfig {
            min: value.handle_suffix.min.unwrap_or(defaults.handle_suffix.min),
            max: value
                .handle_suffix
                .max
                .unwrap_or(defaults.handle_suffix.max)
                .min(9999),
            max_attempts: value
                .handle_suffix
                .max_attempts
                .unwrap_or(defaults.handle_suffix.max_attempts)
                .max(1),
        };
        if handle_suffix.min > handle_suffix.max {
            warn!(
                min = handle_suffix.min,
                max = handle_suffix.max,
                "invalid handle suffix range; using defaults"
            );
            handle_suffix = defaults.handle_suffix;
        }

        let bot_names = value
            .bot_names
            .filter(|names| !names.is_empty())
            .unwrap_or(defaults.bot_names);

        Self {
            password_policy,
            handle_suffix,
            session_ttl: value
                .session_ttl_secs
                .map(|secs| {
                    if secs > MAX_SESSION_TTL_SECS {
                        warn!(secs, max = MAX_SESSION_TTL_SECS, "session ttl too large; clamping");
                    }
                    Duration::from_secs(secs.min(MAX_SESSION_TTL_SECS))
                })
                .unwrap_or(defaults.session_ttl),
            leaderboard_size: value
                .leaderboard_size
                .unwrap_or(defaults.leaderboard_size),
            bot_names,
            account_defaults: AccountDefaults {
                description: value
                    .account_defaults
                    .description
                    .unwrap_or(defaults.account_defaults.description),
                image: value
                    .account_defaults
                    .image
                    .unwrap_or(defaults.account_defaults.image),
                language: value
                    .account_defaults
                    .language
                    .unwrap_or(defaults.account_defaults.language),
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in list of passwords refused regardless of length.
fn default_common_passwords() -> Vec<String> {
    [
        "password",
        "password1",
        "password123",
        "12345678",
        "123456789",
        "1234567890",
        "qwerty123",
        "qwertyuiop",
        "iloveyou",
        "sunshine",
        "princess",
        "football",
        "baseball",
        "welcome1",
        "letmein1",
        "passw0rd",
        "trustno1",
        "superman",
        "starwars",
        "whatever",
        "dragon123",
        "abc12345",
        "admin123",
        "11111111",
        "00000000",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_config_keeps_defaults_for_missing_keys() {
        let raw: RawConfig = serde_json::from_str(r#"{"leaderboard_size": 5}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.leaderboard_size, 5);
        assert_eq!(config.bot_names, vec!["AM".to_string()]);
        assert_eq!(config.handle_suffix.min, 10);
        assert_eq!(config.session_ttl, DEFAULT_SESSION_TTL);
        assert_eq!(config.account_defaults.image, DEFAULT_IMAGE);
    }

    #[test]
    fn raw_config_rejects_inverted_suffix_range() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"handle_suffix": {"min": 500, "max": 20}}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.handle_suffix.min, 10);
        assert_eq!(config.handle_suffix.max, 9999);
    }

    #[test]
    fn raw_config_clamps_oversized_session_ttl() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"session_ttl_secs": 18446744073709551615}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.session_ttl, Duration::from_secs(MAX_SESSION_TTL_SECS));

        let raw: RawConfig = serde_json::from_str(r#"{"session_ttl_secs": 60}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.session_ttl, Duration::from_secs(60));
    }

    #[test]
    fn bot_lookup_matches_exact_names() {
        let config = AppConfig::default();
        assert!(config.is_bot("AM"));
        assert!(!config.is_bot("am"));
        assert!(!config.is_bot("ann#0042"));
    }
}
