//! Output formatting for CLI commands

use serde::Serialize;

use crate::notification::{AuditEntry, AuditSummary, BatchResult};

/// Format output as JSON or plain text based on --json flag
pub fn format_output<T: Serialize>(data: &T, json: bool, text: impl FnOnce(&T) -> String) -> String {
    if json {
        serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
    } else {
        text(data)
    }
}

pub fn render_batch(result: &BatchResult) -> String {
    let mut out = String::new();
    for item in &result.details {
        let detail = item
            .destination
            .as_deref()
            .or(item.error.as_deref())
            .unwrap_or("");
        out.push_str(&format!(
            "{:<18} {:<12} {:<28} {}\n",
            item.status, item.policy_id, truncate(&item.name, 28), detail
        ));
    }
    out.push_str(&format!(
        "\nTotal: {}  enviados: {}  fallidos: {}  bloqueados: {}  sin destinatario: {}",
        result.total, result.sent, result.failed, result.blocked, result.no_contact
    ));
    out
}

pub fn render_audit(entries: &[&AuditEntry], summary: &AuditSummary) -> String {
    if entries.is_empty() {
        return "No hay registros de notificaciones".to_string();
    }

    let mut out = String::new();
    for entry in entries {
        let recipient = if entry.recipient.is_empty() { "-" } else { entry.recipient.as_str() };
        out.push_str(&format!(
            "{}  {:<10} {:<8} {:<18} {:<30} {}\n",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.kind,
            entry.channel,
            entry.status,
            truncate(recipient, 30),
            entry.error.as_deref().unwrap_or("")
        ));
    }
    out.push_str(&format!(
        "\nTotal: {}  enviados: {} ({:.1}%)  fallidos: {} ({:.1}%)  bloqueados: {} ({:.1}%)  sin destinatario: {} ({:.1}%)",
        summary.total,
        summary.sent,
        summary.percent(summary.sent),
        summary.failed,
        summary.percent(summary.failed),
        summary.blocked,
        summary.percent(summary.blocked),
        summary.no_contact,
        summary.percent(summary.no_contact),
    ));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
