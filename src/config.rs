//! Delivery settings - secrets file overlaid by environment variables
//!
//! Resolution order (first non-empty value wins):
//! 1. Environment variables (`SMTP_SERVER`, `SMTP_PORT`, `EMAIL_FROM`, `EMAIL_PASSWORD`,
//!    `TWILIO_ACCOUNT_SID`/`ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`/`AUTH_TOKEN`, `WHATSAPP_FROM`,
//!    `NOTIFY_MODE`, `NOTIFY_TIMEOUT_SECS`, `NOTIFY_SIMULATED_DELAY_MS`)
//! 2. Secrets file (JSON, sections `email`, `whatsapp`, `delivery`), by default
//!    `~/.config/policy-notifier/secrets.json`
//! 3. Built-in defaults
//!
//! Settings are resolved once and handed to the dispatcher builder.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SIMULATED_DELAY_MS: u64 = 500;

/// Whether backends talk to real providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    #[default]
    Simulated,
    Live,
}

impl DeliveryMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "simulated" | "simulado" | "prototipo" => Some(Self::Simulated),
            "live" | "produccion" | "producción" => Some(Self::Live),
            _ => None,
        }
    }
}

/// SMTP submission settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub email_from: String,
    pub email_password: String,
}

impl EmailSettings {
    /// Names of required keys that are still empty
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.email_from.trim().is_empty() {
            missing.push("EMAIL_FROM");
        }
        if self.email_password.trim().is_empty() {
            missing.push("EMAIL_PASSWORD");
        }
        missing
    }
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_server: DEFAULT_SMTP_SERVER.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            email_from: String::new(),
            email_password: String::new(),
        }
    }
}

/// Messaging provider (Twilio) settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhatsappSettings {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender, e.g. `whatsapp:+14155238886`
    pub whatsapp_from: String,
}

impl WhatsappSettings {
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.account_sid.trim().is_empty() {
            missing.push("TWILIO_ACCOUNT_SID");
        }
        if self.auth_token.trim().is_empty() {
            missing.push("TWILIO_AUTH_TOKEN");
        }
        if self.whatsapp_from.trim().is_empty() {
            missing.push("WHATSAPP_FROM");
        }
        missing
    }
}

/// Everything the dispatcher needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub mode: DeliveryMode,
    pub email: EmailSettings,
    pub whatsapp: WhatsappSettings,
    /// Upper bound for one live provider call
    pub timeout_secs: u64,
    /// Fixed latency of the simulated backends
    pub simulated_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: DeliveryMode::Simulated,
            email: EmailSettings::default(),
            whatsapp: WhatsappSettings::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            simulated_delay_ms: DEFAULT_SIMULATED_DELAY_MS,
        }
    }
}

impl Settings {
    /// Default secrets file location
    pub fn default_secrets_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("policy-notifier")
            .join("secrets.json")
    }

    /// Resolve from the process environment and an optional secrets file
    pub fn resolve(secrets_path: Option<&Path>) -> Self {
        let path = secrets_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_secrets_path);
        let secrets = SecretsFile::load(&path);
        Self::from_sources(&secrets, |key| std::env::var(key).ok())
    }

    /// Resolve from explicit sources (environment lookup wins over the file)
    pub fn from_sources<F>(secrets: &SecretsFile, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |keys: &[&str], file_value: Option<&String>| -> Option<String> {
            keys.iter()
                .filter_map(|k| env(*k))
                .chain(file_value.cloned())
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        let email = &secrets.email;
        let whatsapp = &secrets.whatsapp;
        let delivery = &secrets.delivery;

        let smtp_port = lookup(&["SMTP_PORT"], email.smtp_port.as_ref());
        let timeout = lookup(&["NOTIFY_TIMEOUT_SECS"], delivery.timeout_secs.as_ref());
        let delay = lookup(&["NOTIFY_SIMULATED_DELAY_MS"], delivery.simulated_delay_ms.as_ref());
        let mode = lookup(&["NOTIFY_MODE"], delivery.mode.as_ref());

        let settings = Self {
            mode: mode
                .map(|m| {
                    DeliveryMode::parse(&m).unwrap_or_else(|| {
                        warn!(value = %m, "Unknown delivery mode, using simulated");
                        DeliveryMode::Simulated
                    })
                })
                .unwrap_or_default(),
            email: EmailSettings {
                smtp_server: lookup(&["SMTP_SERVER"], email.smtp_server.as_ref())
                    .unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
                smtp_port: parse_nonzero_or("SMTP_PORT", smtp_port, DEFAULT_SMTP_PORT),
                email_from: lookup(&["EMAIL_FROM"], email.email_from.as_ref()).unwrap_or_default(),
                email_password: lookup(&["EMAIL_PASSWORD"], email.email_password.as_ref())
                    .unwrap_or_default(),
            },
            whatsapp: WhatsappSettings {
                account_sid: lookup(&["TWILIO_ACCOUNT_SID", "ACCOUNT_SID"], whatsapp.account_sid.as_ref())
                    .unwrap_or_default(),
                auth_token: lookup(&["TWILIO_AUTH_TOKEN", "AUTH_TOKEN"], whatsapp.auth_token.as_ref())
                    .unwrap_or_default(),
                whatsapp_from: lookup(&["WHATSAPP_FROM"], whatsapp.whatsapp_from.as_ref())
                    .unwrap_or_default(),
            },
            timeout_secs: parse_nonzero_or("NOTIFY_TIMEOUT_SECS", timeout, DEFAULT_TIMEOUT_SECS),
            simulated_delay_ms: parse_or("NOTIFY_SIMULATED_DELAY_MS", delay, DEFAULT_SIMULATED_DELAY_MS),
        };

        debug!(
            mode = ?settings.mode,
            smtp_server = %settings.email.smtp_server,
            smtp_port = settings.email.smtp_port,
            email_configured = settings.email.missing_keys().is_empty(),
            whatsapp_configured = settings.whatsapp.missing_keys().is_empty(),
            "Delivery settings resolved"
        );
        settings
    }

    /// Configured secret values, for scrubbing provider error text
    pub fn secret_values(&self) -> Vec<String> {
        [&self.email.email_password, &self.whatsapp.auth_token]
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect()
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        None => default,
        Some(v) => v.parse().unwrap_or_else(|_| {
            warn!(key, value = %v, "Invalid numeric setting, using default");
            default
        }),
    }
}

/// Like [`parse_or`], but zero also falls back to the default
fn parse_nonzero_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Default + PartialEq + Copy,
{
    let parsed = parse_or(key, value, default);
    if parsed == T::default() {
        warn!(key, "Zero is not a usable value, using default");
        return default;
    }
    parsed
}

/// On-disk secrets store. Values may be strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretsFile {
    #[serde(default)]
    pub email: EmailSecrets,
    #[serde(default)]
    pub whatsapp: WhatsappSecrets,
    #[serde(default)]
    pub delivery: DeliverySecrets,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailSecrets {
    #[serde(default, deserialize_with = "scalar")]
    pub smtp_server: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub smtp_port: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub email_from: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub email_password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhatsappSecrets {
    #[serde(default, deserialize_with = "scalar")]
    pub account_sid: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub auth_token: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub whatsapp_from: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliverySecrets {
    #[serde(default, deserialize_with = "scalar")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub timeout_secs: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub simulated_delay_ms: Option<String>,
}

impl SecretsFile {
    /// Load the secrets file. Missing or unreadable files yield an empty store.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No secrets file");
            return Self::default();
        }
        match fs::read_to_string(path).map_err(anyhow::Error::from).and_then(|content| {
            serde_json::from_str::<SecretsFile>(&content).map_err(anyhow::Error::from)
        }) {
            Ok(secrets) => secrets,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable secrets file");
                Self::default()
            }
        }
    }
}

fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
