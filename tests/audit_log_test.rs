use policy_notifier::notification::{AuditFilter, AuditLog, AuditSummary, DispatchContext};
use policy_notifier::{Channel, DeliveryStatus, DispatcherBuilder, NotificationKind, Outcome};
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_read_returns_most_recent_first() {
    let temp = tempdir().unwrap();
    let dispatcher = DispatcherBuilder::new()
        .simulated_delay(Duration::ZERO)
        .audit_log(AuditLog::new(temp.path().join("audit.jsonl")))
        .build();

    for i in 0..10 {
        let context = DispatchContext::new(NotificationKind::General).with_policy_id(format!("POL-{}", i));
        let outcome = dispatcher
            .send(Channel::Email, &format!("c{}@example.com", i), Some("Aviso"), "Hola", &context)
            .unwrap();
        assert_eq!(outcome, Outcome::Sent);
    }

    let entries = dispatcher.audit_log().read(5).unwrap();
    let policies: Vec<_> = entries.iter().filter_map(|e| e.policy_id.as_deref()).collect();
    assert_eq!(policies, vec!["POL-9", "POL-8", "POL-7", "POL-6", "POL-5"]);
    assert_eq!(dispatcher.audit_log().read(0).unwrap().len(), 0);
}

#[test]
fn test_reads_lines_written_by_other_tools() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("notificaciones.jsonl");
    std::fs::write(
        &path,
        concat!(
            r#"{"timestamp":"2024-05-02T10:15:00","tipo":"cartera","canal":"email","destinatario":"a@b.co","mensaje":"m","estado":"enviado","id_cliente":"C1","id_poliza":"P1","error":null,"usuario":null}"#,
            "\n",
            "garbage line\n",
            r#"{"timestamp":"2024-05-02T10:16:00+00:00","tipo":"renovacion","canal":"whatsapp","destinatario":"+573001234567","mensaje":"","estado":"bloqueado","id_cliente":"C2","id_poliza":"P2","error":"Sin consentimiento de WhatsApp","usuario":"ops"}"#,
            "\n",
        ),
    )
    .unwrap();

    let entries = AuditLog::new(&path).read(10).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].status, DeliveryStatus::Blocked);
    assert_eq!(entries[1].operator, "unknown");

    let filter = AuditFilter {
        channel: Some(" WhatsApp ".to_string()),
        ..Default::default()
    };
    let view = filter.apply(&entries);
    assert_eq!(view.len(), 1);

    let summary = AuditSummary::from_entries(entries.iter());
    assert_eq!(summary.total, 2);
    assert_eq!(summary.percent(summary.sent), 50.0);
}
