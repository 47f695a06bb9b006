//! Message text for arrears and renewal notifications

use super::channel::{Channel, NotificationKind};
use crate::record::NotificationRecord;

/// Rendered message; `subject` is only set for email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub subject: Option<String>,
    pub body: String,
}

/// Render the message for `record`. Same inputs always give the same text.
pub fn compose(record: &NotificationRecord, kind: NotificationKind, channel: Channel) -> ComposedMessage {
    let (subject, body) = match kind {
        NotificationKind::Arrears => arrears(record),
        NotificationKind::Renewal => renewal(record),
        NotificationKind::General => general(record),
    };

    ComposedMessage {
        subject: match channel {
            Channel::Email => Some(subject),
            Channel::Whatsapp => None,
        },
        body,
    }
}

fn arrears(record: &NotificationRecord) -> (String, String) {
    let subject = format!("Recordatorio de pago - Póliza {}", record.policy_number());
    let body = format!(
        "Hola {}, registramos un saldo en mora por ${}. Fecha límite: {}. Puedes pagar aquí: {}",
        record.display_name(),
        format_amount(record.arrears_amount()),
        record.due_date(),
        record.payment_link(),
    );
    (subject, body)
}

fn renewal(record: &NotificationRecord) -> (String, String) {
    let policy = record.policy_number();
    let days = record.days_to_expiry();

    let (countdown, call) = match days {
        d if d < 0 => (
            format!("Tu póliza venció hace {} días", d.unsigned_abs()),
            "Es importante que gestionemos tu renovación lo antes posible.",
        ),
        0 => (
            "Tu póliza vence hoy".to_string(),
            "¿Deseas que gestionemos tu renovación?",
        ),
        d => (format!("Faltan {} días", d), "¿Deseas que gestionemos tu renovación?"),
    };

    let subject = match days {
        d if d < 0 => format!(
            "⚠️ URGENTE: Renovación de póliza {} - Vencida hace {} días",
            policy,
            d.unsigned_abs()
        ),
        0 => format!("Renovación de póliza {} - Vence hoy", policy),
        d => format!("Renovación de póliza {} - Vence en {} días", policy, d),
    };

    let body = format!(
        "Hola {}, tu póliza {} ({} - {}) vence el {}. {}. {}",
        record.display_name(),
        policy,
        record.product(),
        record.plan(),
        record.end_of_validity(),
        countdown,
        call,
    );
    (subject, body)
}

fn general(record: &NotificationRecord) -> (String, String) {
    let policy = record.policy_number();
    (
        format!("Información de tu póliza {}", policy),
        format!(
            "Hola {}, te escribimos en relación con tu póliza {}.",
            record.display_name(),
            policy
        ),
    )
}

/// Whole units with comma-grouped thousands, halves to even: 1234567.5 -> "1,234,568", 2.5 -> "2"
pub fn format_amount(amount: f64) -> String {
    let formatted = format!("{:.0}", amount);
    let (sign, digits) = match formatted.strip_prefix('-') {
        // "-0" after rounding small negatives
        Some(d) if d.bytes().all(|b| b == b'0') => ("", d),
        Some(d) => ("-", d),
        None => ("", formatted.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}", sign, grouped)
}
