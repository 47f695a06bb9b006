//! Per-channel eligibility: contact presence first, then consent

use super::channel::Channel;
use crate::record::NotificationRecord;

/// Tokens accepted as an explicit opt-in (compared lowercased and trimmed)
pub const CONSENT_TOKENS: [&str; 8] = ["sí", "si", "yes", "true", "1", "1.0", "s", "y"];

/// Normalize a free-form consent cell. Missing or unrecognised values are `false`.
pub fn parse_consent(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().to_lowercase())
        .is_some_and(|v| CONSENT_TOKENS.contains(&v.as_str()))
}

/// Eligibility of one record on one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// Contact to deliver to
    Eligible(String),
    /// Contact present, consent missing
    Blocked(String),
    /// No contact data for the channel
    NoContact(String),
}

/// Decide whether `record` may be contacted on `channel`.
///
/// A missing contact wins over a missing consent: a record with neither is
/// reported as `NoContact`.
pub fn resolve(record: &NotificationRecord, channel: Channel) -> Eligibility {
    let (contact, consent) = match channel {
        Channel::Email => (record.email.as_deref(), record.consent_email.as_deref()),
        Channel::Whatsapp => (record.phone.as_deref(), record.consent_whatsapp.as_deref()),
    };

    let contact = contact.map(str::trim).filter(|c| !c.is_empty());
    let Some(contact) = contact else {
        return Eligibility::NoContact(format!("No hay {} disponible", channel.as_str()));
    };

    if !parse_consent(consent) {
        return Eligibility::Blocked(format!("Sin consentimiento de {}", channel.label()));
    }

    Eligibility::Eligible(contact.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(email: Option<&str>, consent: Option<&str>) -> NotificationRecord {
        NotificationRecord {
            email: email.map(String::from),
            consent_email: consent.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_consent_tokens() {
        for token in ["Sí", "SI", " yes ", "TRUE", "1", "1.0", "s", "Y"] {
            assert!(parse_consent(Some(token)), "{token} should be consent");
        }
        for token in ["no", "0", "false", "", "n", "2", "sii"] {
            assert!(!parse_consent(Some(token)), "{token} should not be consent");
        }
        assert!(!parse_consent(None));
    }

    #[test]
    fn test_no_contact_dominates_blocked() {
        for consent in [Some("sí"), Some("no"), None] {
            for email in [None, Some(""), Some("   ")] {
                assert_eq!(
                    resolve(&record(email, consent), Channel::Email),
                    Eligibility::NoContact("No hay email disponible".to_string())
                );
            }
        }
    }

    #[test]
    fn test_blocked_without_consent() {
        assert_eq!(
            resolve(&record(Some("a@b.com"), Some("no")), Channel::Email),
            Eligibility::Blocked("Sin consentimiento de email".to_string())
        );
        assert_eq!(
            resolve(&record(Some("a@b.com"), None), Channel::Email),
            Eligibility::Blocked("Sin consentimiento de email".to_string())
        );
    }

    #[test]
    fn test_whatsapp_uses_phone_and_its_own_consent() {
        let rec = NotificationRecord {
            phone: Some("3001234567".to_string()),
            consent_whatsapp: Some("no".to_string()),
            consent_email: Some("sí".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve(&rec, Channel::Whatsapp),
            Eligibility::Blocked("Sin consentimiento de WhatsApp".to_string())
        );

        let rec = NotificationRecord {
            phone: None,
            ..rec
        };
        assert_eq!(
            resolve(&rec, Channel::Whatsapp),
            Eligibility::NoContact("No hay whatsapp disponible".to_string())
        );
    }

    #[test]
    fn test_eligible_contact_is_trimmed() {
        assert_eq!(
            resolve(&record(Some(" a@b.com "), Some("Sí")), Channel::Email),
            Eligibility::Eligible("a@b.com".to_string())
        );
    }
}
