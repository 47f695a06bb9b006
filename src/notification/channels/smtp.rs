//! Live email backend - SMTP submission with STARTTLS

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;
use tracing::{error, info};

use crate::config::EmailSettings;
use crate::notification::channel::{Channel, DeliveryChannel, DeliveryError, OutboundMessage};

/// SMTP channel built from resolved email settings
pub struct SmtpChannel {
    mailer: SmtpTransport,
    from: Mailbox,
}

impl SmtpChannel {
    /// Build the transport. No connection is opened until the first delivery.
    pub fn new(settings: &EmailSettings, timeout: Duration) -> Result<Self, DeliveryError> {
        let from: Mailbox = settings.email_from.trim().parse().map_err(
            |e: lettre::address::AddressError| {
                DeliveryError::Configuration(format!("EMAIL_FROM inválido: {}", e))
            },
        )?;

        let creds = Credentials::new(
            settings.email_from.trim().to_string(),
            settings.email_password.clone(),
        );

        let mailer = SmtpTransport::starttls_relay(&settings.smtp_server)
            .map_err(|e| {
                DeliveryError::Configuration(format!(
                    "Servidor SMTP inválido {}: {}",
                    settings.smtp_server, e
                ))
            })?
            .port(settings.smtp_port)
            .credentials(creds)
            .timeout(Some(timeout))
            .build();

        Ok(Self { mailer, from })
    }
}

impl DeliveryChannel for SmtpChannel {
    fn name(&self) -> &str {
        "smtp"
    }

    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn deliver(&self, message: &OutboundMessage<'_>) -> Result<(), DeliveryError> {
        let to: Mailbox = message.recipient.parse().map_err(|e: lettre::address::AddressError| {
            DeliveryError::Transport(format!("Destinatario inválido {}: {}", message.recipient, e))
        })?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.unwrap_or_default())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.to_string())
            .map_err(|e| DeliveryError::Transport(format!("No se pudo construir el email: {}", e)))?;

        match self.mailer.send(&email) {
            Ok(_) => {
                info!(channel = "email", recipient = %message.recipient, "Email submitted");
                Ok(())
            }
            Err(e) => {
                error!(channel = "email", error = %e, "SMTP submission failed");
                Err(DeliveryError::Transport(e.to_string()))
            }
        }
    }
}
