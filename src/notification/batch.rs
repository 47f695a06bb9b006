//! Batch coordinator - resolve, compose and dispatch a record set, one record at a time

use serde::Serialize;
use tracing::info;

use super::audit::AuditError;
use super::channel::{Channel, DeliveryStatus, NotificationKind, Outcome};
use super::composer::compose;
use super::dispatcher::{normalize_phone, DispatchContext, Dispatcher};
use super::resolver::{resolve, Eligibility};
use crate::record::NotificationRecord;

/// Per-record line of a batch report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    pub policy_id: String,
    pub name: String,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated outcome of one run. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub blocked: usize,
    pub no_contact: usize,
    pub details: Vec<BatchItem>,
}

impl BatchResult {
    fn with_total(total: usize) -> Self {
        Self {
            total,
            details: Vec::with_capacity(total),
            ..Default::default()
        }
    }

    fn push(&mut self, item: BatchItem) {
        match item.status {
            DeliveryStatus::Sent => self.sent += 1,
            DeliveryStatus::Failed => self.failed += 1,
            DeliveryStatus::Blocked => self.blocked += 1,
            DeliveryStatus::NoContact => self.no_contact += 1,
        }
        self.details.push(item);
    }

    /// `sent + failed + blocked + no_contact == total`
    pub fn reconciles(&self) -> bool {
        self.sent + self.failed + self.blocked + self.no_contact == self.total
            && self.details.len() == self.total
    }
}

/// Runs batches against one dispatcher
pub struct BatchCoordinator<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Process `records` sequentially.
    ///
    /// `progress` is called after each record with `(processed, total)`.
    /// Failed items do not stop the run; an audit write failure does.
    pub fn run(
        &self,
        records: &[NotificationRecord],
        channel: Channel,
        kind: NotificationKind,
        operator: Option<&str>,
        mut progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<BatchResult, AuditError> {
        let total = records.len();
        let mut result = BatchResult::with_total(total);

        info!(total, channel = %channel, kind = %kind, "Batch started");

        for (idx, record) in records.iter().enumerate() {
            let item = self.process(record, channel, kind, operator)?;
            result.push(item);

            if let Some(sink) = progress.as_mut() {
                sink(idx + 1, total);
            }
        }

        debug_assert!(result.reconciles());
        info!(
            total = result.total,
            sent = result.sent,
            failed = result.failed,
            blocked = result.blocked,
            no_contact = result.no_contact,
            "Batch finished"
        );
        Ok(result)
    }

    fn process(
        &self,
        record: &NotificationRecord,
        channel: Channel,
        kind: NotificationKind,
        operator: Option<&str>,
    ) -> Result<BatchItem, AuditError> {
        let context = DispatchContext::for_record(record, kind, operator);
        let mut item = BatchItem {
            policy_id: record.policy_number().to_string(),
            name: record.display_name().to_string(),
            status: DeliveryStatus::Failed,
            destination: None,
            error: None,
        };

        let (contact, outcome) = match resolve(record, channel) {
            Eligibility::NoContact(reason) => {
                let outcome = Outcome::NoContact(reason);
                self.dispatcher.record_unsent(channel, "", &outcome, &context)?;
                (None, outcome)
            }
            Eligibility::Blocked(reason) => {
                let contact = match channel {
                    Channel::Email => record.email.as_deref(),
                    Channel::Whatsapp => record.phone.as_deref(),
                }
                .unwrap_or("");
                let outcome = Outcome::Blocked(reason);
                self.dispatcher.record_unsent(channel, contact, &outcome, &context)?;
                (None, outcome)
            }
            Eligibility::Eligible(contact) => {
                let message = compose(record, kind, channel);
                let outcome = self.dispatcher.send(
                    channel,
                    &contact,
                    message.subject.as_deref(),
                    &message.body,
                    &context,
                )?;
                let destination = match channel {
                    Channel::Email => contact,
                    Channel::Whatsapp => normalize_phone(&contact),
                };
                (Some(destination), outcome)
            }
        };

        item.status = outcome.status();
        match outcome {
            Outcome::Sent => item.destination = contact,
            Outcome::Failed(e) if e.is_empty() => item.error = Some("Error desconocido".to_string()),
            Outcome::Failed(e) | Outcome::Blocked(e) | Outcome::NoContact(e) => item.error = Some(e),
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::audit::AuditLog;
    use crate::notification::builder::DispatcherBuilder;
    use std::time::Duration;
    use tempfile::tempdir;

    fn create_test_dispatcher() -> (Dispatcher, tempfile::TempDir) {
        let temp = tempdir().unwrap();
        let dispatcher = DispatcherBuilder::new()
            .simulated_delay(Duration::ZERO)
            .audit_log(AuditLog::new(temp.path().join("audit.jsonl")))
            .build();
        (dispatcher, temp)
    }

    fn record(policy: &str, email: Option<&str>, consent: Option<&str>) -> NotificationRecord {
        NotificationRecord {
            policy_number: Some(policy.to_string()),
            customer_name: Some(format!("Cliente {}", policy)),
            email: email.map(String::from),
            consent_email: consent.map(String::from),
            arrears_amount: Some(1000.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_mixed_batch_reconciles() {
        let (dispatcher, _temp) = create_test_dispatcher();
        let records = vec![
            record("P1", Some("a@b.com"), Some("Sí")),
            record("P2", Some("c@d.com"), Some("no")),
            record("P3", None, Some("sí")),
            record("P4", Some("e@f.com"), Some("1")),
        ];

        let result = BatchCoordinator::new(&dispatcher)
            .run(&records, Channel::Email, NotificationKind::Arrears, Some("ops"), None)
            .unwrap();

        assert!(result.reconciles());
        assert_eq!((result.total, result.sent, result.failed, result.blocked, result.no_contact), (4, 2, 0, 1, 1));

        assert_eq!(result.details[0].status, DeliveryStatus::Sent);
        assert_eq!(result.details[0].destination.as_deref(), Some("a@b.com"));
        assert_eq!(result.details[1].error.as_deref(), Some("Sin consentimiento de email"));
        assert_eq!(result.details[2].status, DeliveryStatus::NoContact);
        assert_eq!(result.details[2].error.as_deref(), Some("No hay email disponible"));
        assert_eq!(result.details[3].name, "Cliente P4");

        let entries = dispatcher.audit_log().read(100).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.operator == "ops"));
        assert_eq!(entries[0].policy_id.as_deref(), Some("P4"));
    }

    #[test]
    fn test_progress_reported_after_each_record() {
        let (dispatcher, _temp) = create_test_dispatcher();
        let records = vec![
            record("P1", Some("a@b.com"), Some("si")),
            record("P2", None, None),
            record("P3", Some("c@d.com"), None),
        ];

        let mut calls = Vec::new();
        let mut sink = |done: usize, total: usize| calls.push((done, total));
        BatchCoordinator::new(&dispatcher)
            .run(&records, Channel::Email, NotificationKind::Renewal, None, Some(&mut sink))
            .unwrap();

        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_empty_batch() {
        let (dispatcher, _temp) = create_test_dispatcher();
        let result = BatchCoordinator::new(&dispatcher)
            .run(&[], Channel::Whatsapp, NotificationKind::Arrears, None, None)
            .unwrap();
        assert_eq!(result, BatchResult::default());
        assert!(dispatcher.audit_log().read(10).unwrap().is_empty());
    }
}
