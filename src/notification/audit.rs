//! Audit trail - append-only JSONL file of every notification attempt

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::channel::{Channel, DeliveryStatus, NotificationKind};

/// Default log location, relative to the working directory
pub const DEFAULT_LOG_PATH: &str = "logs/notificaciones.jsonl";

/// Operator recorded when the caller does not supply one
pub const UNKNOWN_OPERATOR: &str = "unknown";

/// Writing the trail failed. Always fatal for the attempt being recorded.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("audit entry could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One attempt (JSONL line)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "tipo")]
    pub kind: NotificationKind,
    #[serde(rename = "canal")]
    pub channel: Channel,
    #[serde(rename = "destinatario", default)]
    pub recipient: String,
    #[serde(rename = "mensaje", default)]
    pub message: String,
    #[serde(rename = "estado")]
    pub status: DeliveryStatus,
    #[serde(rename = "id_cliente", default)]
    pub customer_id: Option<String>,
    #[serde(rename = "id_poliza", default)]
    pub policy_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(rename = "usuario", default = "unknown_operator", deserialize_with = "operator_or_unknown")]
    pub operator: String,
}

impl AuditEntry {
    /// Entry stamped with the current time
    pub fn now(kind: NotificationKind, channel: Channel, status: DeliveryStatus) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            channel,
            recipient: String::new(),
            message: String::new(),
            status,
            customer_id: None,
            policy_id: None,
            error: None,
            operator: UNKNOWN_OPERATOR.to_string(),
        }
    }
}

fn unknown_operator() -> String {
    UNKNOWN_OPERATOR.to_string()
}

fn operator_or_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let operator = Option::<String>::deserialize(deserializer)?;
    Ok(operator
        .filter(|o| !o.trim().is_empty())
        .unwrap_or_else(unknown_operator))
}

/// Accepts RFC 3339 and naive ISO-8601 (local time) timestamps
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(serde::de::Error::custom)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| serde::de::Error::custom(format!("nonexistent local time: {}", raw)))
}

/// Append-only audit log backed by one JSONL file
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry (with an exclusive advisory lock on the file)
    pub fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        use fs2::FileExt;

        let line = serde_json::to_string(entry)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        file.lock_exclusive().map_err(|e| self.io_error(e))?;
        let written = writeln!(file, "{}", line).and_then(|_| file.flush());
        let unlocked = file.unlock();
        written.map_err(|e| self.io_error(e))?;
        unlocked.map_err(|e| self.io_error(e))?;

        debug!(
            path = %self.path.display(),
            status = %entry.status,
            channel = %entry.channel,
            "Audit entry appended"
        );
        Ok(())
    }

    /// Most recent `limit` entries, newest first. Malformed lines are skipped.
    pub fn read(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut entries = Vec::new();
        for (idx, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            let Ok(line) = std::str::from_utf8(&line) else {
                warn!(line = idx + 1, "Skipping non-UTF-8 audit line");
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(line = idx + 1, error = %e, "Skipping malformed audit line"),
            }
        }

        let start = entries.len().saturating_sub(limit);
        let mut recent = entries.split_off(start);
        recent.reverse();
        Ok(recent)
    }

    fn io_error(&self, source: io::Error) -> AuditError {
        AuditError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }
}

/// Trazability filter: case-insensitive, trimmed exact match on each set field
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub kind: Option<String>,
    pub channel: Option<String>,
    pub status: Option<String>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        field_matches(self.kind.as_deref(), entry.kind.as_str())
            && field_matches(self.channel.as_deref(), entry.channel.as_str())
            && field_matches(self.status.as_deref(), entry.status.as_str())
    }

    pub fn apply<'a>(&self, entries: &'a [AuditEntry]) -> Vec<&'a AuditEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}

fn field_matches(wanted: Option<&str>, actual: &str) -> bool {
    match wanted.map(str::trim).filter(|w| !w.is_empty()) {
        None => true,
        Some(w) => w.to_lowercase() == actual.trim().to_lowercase(),
    }
}

/// Status counts over a (filtered) view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub blocked: usize,
    pub no_contact: usize,
}

impl AuditSummary {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a AuditEntry>) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            summary.total += 1;
            match entry.status {
                DeliveryStatus::Sent => summary.sent += 1,
                DeliveryStatus::Failed => summary.failed += 1,
                DeliveryStatus::Blocked => summary.blocked += 1,
                DeliveryStatus::NoContact => summary.no_contact += 1,
            }
        }
        summary
    }

    /// Share of `count` in the total, as a percentage
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(status: DeliveryStatus, recipient: &str) -> AuditEntry {
        let mut e = AuditEntry::now(NotificationKind::Arrears, Channel::Email, status);
        e.recipient = recipient.to_string();
        e
    }

    #[test]
    fn test_entry_wire_format() {
        let mut e = entry(DeliveryStatus::Blocked, "a@b.com");
        e.error = Some("Sin consentimiento de email".to_string());
        let json: serde_json::Value = serde_json::to_value(&e).unwrap();

        assert_eq!(json["tipo"], "cartera");
        assert_eq!(json["canal"], "email");
        assert_eq!(json["estado"], "bloqueado");
        assert_eq!(json["destinatario"], "a@b.com");
        assert_eq!(json["usuario"], "unknown");
        assert!(json["id_poliza"].is_null());
    }

    #[test]
    fn test_entry_accepts_legacy_lines() {
        let line = r#"{"timestamp": "2024-01-10T09:30:00.123456", "tipo": "renovacion", "canal": "whatsapp",
            "destinatario": "+573001234567", "mensaje": "hola", "estado": "enviado",
            "id_cliente": "7", "id_poliza": "P-7", "error": null, "usuario": null, "extra": 1}"#;
        let parsed: AuditEntry = serde_json::from_str(line).unwrap();
        assert_eq!(parsed.kind, NotificationKind::Renewal);
        assert_eq!(parsed.channel, Channel::Whatsapp);
        assert_eq!(parsed.operator, "unknown");
        assert_eq!(parsed.policy_id.as_deref(), Some("P-7"));
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let temp = tempdir().unwrap();
        let log = AuditLog::new(temp.path().join("none.jsonl"));
        assert!(log.read(10).unwrap().is_empty());
    }

    #[test]
    fn test_append_creates_directories() {
        let temp = tempdir().unwrap();
        let log = AuditLog::new(temp.path().join("nested/logs/audit.jsonl"));
        log.append(&entry(DeliveryStatus::Sent, "a@b.com")).unwrap();
        log.append(&entry(DeliveryStatus::Sent, "c@d.com")).unwrap();

        let entries = log.read(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].recipient, "c@d.com");
    }

    #[test]
    fn test_read_skips_malformed_lines() {
        let temp = tempdir().unwrap();
        let log = AuditLog::new(temp.path().join("audit.jsonl"));
        log.append(&entry(DeliveryStatus::Sent, "first")).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
            writeln!(file, "{{not json").unwrap();
            writeln!(file).unwrap();
            writeln!(file, r#"{{"estado": "enviado"}}"#).unwrap();
        }
        log.append(&entry(DeliveryStatus::Failed, "second")).unwrap();

        let entries = log.read(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].recipient, "second");
        assert_eq!(entries[1].recipient, "first");
    }

    #[test]
    fn test_filter_is_case_insensitive_and_trimmed() {
        let entries = vec![
            entry(DeliveryStatus::Sent, "a"),
            entry(DeliveryStatus::Blocked, "b"),
        ];
        let filter = AuditFilter {
            status: Some(" Bloqueado ".to_string()),
            channel: Some("EMAIL".to_string()),
            ..Default::default()
        };
        let view = filter.apply(&entries);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].recipient, "b");

        let filter = AuditFilter {
            kind: Some("renovacion".to_string()),
            ..Default::default()
        };
        assert!(filter.apply(&entries).is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let entries = vec![
            entry(DeliveryStatus::Sent, "a"),
            entry(DeliveryStatus::Sent, "b"),
            entry(DeliveryStatus::Failed, "c"),
            entry(DeliveryStatus::NoContact, ""),
        ];
        let summary = AuditSummary::from_entries(&entries);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.sent, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.blocked, 0);
        assert_eq!(summary.no_contact, 1);
        assert_eq!(summary.percent(summary.sent), 50.0);
        assert_eq!(AuditSummary::default().percent(0), 0.0);
    }
}
