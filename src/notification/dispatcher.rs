//! Dispatcher - routes one message to its channel backend and records the attempt

use std::sync::Arc;
use tracing::{info, warn};

use super::audit::{AuditEntry, AuditError, AuditLog, UNKNOWN_OPERATOR};
use super::channel::{Channel, DeliveryChannel, NotificationKind, OutboundMessage, Outcome};
use crate::record::NotificationRecord;

/// Country code assumed for WhatsApp numbers without a leading `+`
pub const DEFAULT_COUNTRY_CODE: &str = "57";

/// Length of a national mobile number for the default country
const NATIONAL_NUMBER_LEN: usize = 10;

/// Who and what an attempt is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    pub kind: NotificationKind,
    pub customer_id: Option<String>,
    pub policy_id: Option<String>,
    pub operator: Option<String>,
}

impl DispatchContext {
    pub fn new(kind: NotificationKind) -> Self {
        Self {
            kind,
            customer_id: None,
            policy_id: None,
            operator: None,
        }
    }

    /// Context for a record-driven attempt
    pub fn for_record(record: &NotificationRecord, kind: NotificationKind, operator: Option<&str>) -> Self {
        Self {
            kind,
            customer_id: Some(record.customer_id().to_string()),
            policy_id: Some(record.policy_number().to_string()),
            operator: operator.map(String::from),
        }
    }

    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_policy_id(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id = Some(policy_id.into());
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }
}

/// Sends over the email or WhatsApp backend; every call leaves one audit entry
pub struct Dispatcher {
    email: Arc<dyn DeliveryChannel>,
    whatsapp: Arc<dyn DeliveryChannel>,
    audit: AuditLog,
    /// Values scrubbed from provider error text
    secrets: Vec<String>,
}

impl Dispatcher {
    pub fn new(
        email: Arc<dyn DeliveryChannel>,
        whatsapp: Arc<dyn DeliveryChannel>,
        audit: AuditLog,
    ) -> Self {
        for (slot, backend) in [(Channel::Email, &email), (Channel::Whatsapp, &whatsapp)] {
            if backend.channel() != slot {
                warn!(
                    slot = %slot,
                    backend = backend.name(),
                    serves = %backend.channel(),
                    "Backend registered for another channel"
                );
            }
        }
        info!(email = email.name(), whatsapp = whatsapp.name(), "Dispatcher ready");
        Self {
            email,
            whatsapp,
            audit,
            secrets: Vec::new(),
        }
    }

    /// Secret values to redact from error text before it is logged or returned
    pub fn with_redacted_secrets(mut self, secrets: Vec<String>) -> Self {
        self.secrets = secrets.into_iter().filter(|s| !s.is_empty()).collect();
        self
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Backend name per channel
    pub fn backend_name(&self, channel: Channel) -> &str {
        self.backend(channel).name()
    }

    fn backend(&self, channel: Channel) -> &dyn DeliveryChannel {
        match channel {
            Channel::Email => self.email.as_ref(),
            Channel::Whatsapp => self.whatsapp.as_ref(),
        }
    }

    /// Deliver one message.
    ///
    /// Delivery problems come back as `Outcome::Failed` and a blank recipient
    /// as `Outcome::NoContact`; only a failure to write the audit entry is
    /// returned as an error.
    pub fn send(
        &self,
        channel: Channel,
        recipient: &str,
        subject: Option<&str>,
        body: &str,
        context: &DispatchContext,
    ) -> Result<Outcome, AuditError> {
        let recipient = match channel {
            Channel::Email => recipient.trim().to_string(),
            Channel::Whatsapp => normalize_phone(recipient),
        };

        if recipient.is_empty() {
            let outcome = Outcome::NoContact(format!("No hay {} disponible", channel.as_str()));
            warn!(channel = %channel, policy_id = ?context.policy_id, "Blank recipient, nothing delivered");
            self.record(channel, &recipient, "", &outcome, context)?;
            return Ok(outcome);
        }

        let backend = self.backend(channel);
        let message = OutboundMessage {
            recipient: &recipient,
            subject,
            body,
        };

        let outcome = match backend.deliver(&message) {
            Ok(()) => Outcome::Sent,
            Err(e) => {
                let reason = redact(&e.to_string(), &self.secrets);
                warn!(
                    channel = %channel,
                    backend = backend.name(),
                    recipient = %recipient,
                    policy_id = ?context.policy_id,
                    error = %reason,
                    "Delivery failed"
                );
                Outcome::Failed(reason)
            }
        };

        self.record(channel, &recipient, body, &outcome, context)?;
        Ok(outcome)
    }

    /// Record an attempt that was stopped before delivery (blocked or no contact)
    pub fn record_unsent(
        &self,
        channel: Channel,
        recipient: &str,
        outcome: &Outcome,
        context: &DispatchContext,
    ) -> Result<(), AuditError> {
        debug_assert!(!outcome.is_sent(), "record_unsent called with a sent outcome");
        info!(
            channel = %channel,
            policy_id = ?context.policy_id,
            status = %outcome.status(),
            "Attempt not delivered"
        );
        self.record(channel, recipient.trim(), "", outcome, context)
    }

    fn record(
        &self,
        channel: Channel,
        recipient: &str,
        message: &str,
        outcome: &Outcome,
        context: &DispatchContext,
    ) -> Result<(), AuditError> {
        let mut entry = AuditEntry::now(context.kind, channel, outcome.status());
        entry.recipient = recipient.to_string();
        entry.message = message.to_string();
        entry.customer_id = context.customer_id.clone();
        entry.policy_id = context.policy_id.clone();
        entry.error = outcome.error().map(String::from);
        entry.operator = context
            .operator
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(UNKNOWN_OPERATOR)
            .to_string();

        self.audit.append(&entry)
    }
}

/// E.164-style WhatsApp number: keeps an explicit `+`, otherwise assumes the
/// default country code unless the digits already start with it.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    // numeric spreadsheet cells arrive as "3001234567.0"
    let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return trimmed.to_string();
    }
    if trimmed.starts_with('+') {
        return format!("+{}", digits);
    }
    if digits.starts_with(DEFAULT_COUNTRY_CODE) && digits.len() > NATIONAL_NUMBER_LEN {
        return format!("+{}", digits);
    }
    format!("+{}{}", DEFAULT_COUNTRY_CODE, digits)
}

fn redact(text: &str, secrets: &[String]) -> String {
    secrets
        .iter()
        .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), "***"))
}
