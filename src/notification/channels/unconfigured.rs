//! Placeholder backend for live mode without credentials

use crate::notification::channel::{Channel, DeliveryChannel, DeliveryError, OutboundMessage};

/// Live backend whose credentials are missing. Every delivery fails with guidance.
pub struct UnconfiguredChannel {
    channel: Channel,
    guidance: String,
}

impl UnconfiguredChannel {
    pub fn new(channel: Channel, missing: &[&str]) -> Self {
        Self {
            channel,
            guidance: guidance(channel, missing),
        }
    }

    /// Credentials present but rejected while building the live backend
    pub fn invalid(channel: Channel, reason: impl Into<String>) -> Self {
        Self {
            channel,
            guidance: reason.into(),
        }
    }

    pub fn guidance(&self) -> &str {
        &self.guidance
    }
}

impl DeliveryChannel for UnconfiguredChannel {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn channel(&self) -> Channel {
        self.channel
    }

    fn deliver(&self, _message: &OutboundMessage<'_>) -> Result<(), DeliveryError> {
        Err(DeliveryError::Configuration(self.guidance.clone()))
    }
}

fn guidance(channel: Channel, missing: &[&str]) -> String {
    let (section, keys): (&str, &[&str]) = match channel {
        Channel::Email => ("email", &["email_from", "email_password"][..]),
        Channel::Whatsapp => ("whatsapp", &["account_sid", "auth_token", "whatsapp_from"][..]),
    };
    format!(
        "Configuración de {} no encontrada. Define las variables de entorno {} \
         o completa la sección [{}] ({}) del archivo de secretos.",
        channel.label(),
        missing.join(", "),
        section,
        keys.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_always_fails_with_guidance() {
        let channel = UnconfiguredChannel::new(Channel::Whatsapp, &["TWILIO_AUTH_TOKEN"]);
        let err = channel
            .deliver(&OutboundMessage {
                recipient: "+573001234567",
                subject: None,
                body: "hola",
            })
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Configuration(_)));
        let text = err.to_string();
        assert!(text.contains("WhatsApp"));
        assert!(text.contains("TWILIO_AUTH_TOKEN"));
        assert!(text.contains("[whatsapp]"));
    }
}
