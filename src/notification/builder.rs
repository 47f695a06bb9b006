//! Dispatcher builder - picks simulated or live backends from settings

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::audit::AuditLog;
use super::channel::{Channel, DeliveryChannel};
use super::channels::{SimulatedChannel, SmtpChannel, TwilioChannel, UnconfiguredChannel};
use super::dispatcher::Dispatcher;
use crate::config::{DeliveryMode, Settings};

/// Builds a [`Dispatcher`]; settings are read once here, never per send
pub struct DispatcherBuilder {
    settings: Settings,
    audit_log: AuditLog,
    email: Option<Arc<dyn DeliveryChannel>>,
    whatsapp: Option<Arc<dyn DeliveryChannel>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            audit_log: AuditLog::default(),
            email: None,
            whatsapp: None,
        }
    }

    /// Use resolved settings
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Override the delivery mode
    pub fn mode(mut self, mode: DeliveryMode) -> Self {
        self.settings.mode = mode;
        self
    }

    /// Override the simulated latency
    pub fn simulated_delay(mut self, delay: Duration) -> Self {
        self.settings.simulated_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn audit_log(mut self, audit_log: AuditLog) -> Self {
        self.audit_log = audit_log;
        self
    }

    /// Replace the email backend
    pub fn email_channel(mut self, channel: Arc<dyn DeliveryChannel>) -> Self {
        self.email = Some(channel);
        self
    }

    /// Replace the WhatsApp backend
    pub fn whatsapp_channel(mut self, channel: Arc<dyn DeliveryChannel>) -> Self {
        self.whatsapp = Some(channel);
        self
    }

    pub fn build(self) -> Dispatcher {
        let email = self
            .email
            .clone()
            .unwrap_or_else(|| self.backend_for(Channel::Email));
        let whatsapp = self
            .whatsapp
            .clone()
            .unwrap_or_else(|| self.backend_for(Channel::Whatsapp));
        let secrets = self.settings.secret_values();

        Dispatcher::new(email, whatsapp, self.audit_log).with_redacted_secrets(secrets)
    }

    fn backend_for(&self, channel: Channel) -> Arc<dyn DeliveryChannel> {
        if self.settings.mode == DeliveryMode::Simulated {
            let delay = Duration::from_millis(self.settings.simulated_delay_ms);
            info!(channel = %channel, delay_ms = self.settings.simulated_delay_ms, "Using simulated backend");
            return Arc::new(SimulatedChannel::new(channel, delay));
        }

        let timeout = Duration::from_secs(self.settings.timeout_secs);
        let missing = match channel {
            Channel::Email => self.settings.email.missing_keys(),
            Channel::Whatsapp => self.settings.whatsapp.missing_keys(),
        };
        if !missing.is_empty() {
            let backend = UnconfiguredChannel::new(channel, &missing);
            warn!(channel = %channel, guidance = backend.guidance(), "Live mode without credentials");
            return Arc::new(backend);
        }

        let live: Result<Arc<dyn DeliveryChannel>, _> = match channel {
            Channel::Email => SmtpChannel::new(&self.settings.email, timeout)
                .map(|c| Arc::new(c) as Arc<dyn DeliveryChannel>),
            Channel::Whatsapp => TwilioChannel::new(&self.settings.whatsapp, timeout)
                .map(|c| Arc::new(c) as Arc<dyn DeliveryChannel>),
        };

        match live {
            Ok(backend) => {
                info!(channel = %channel, backend = backend.name(), "Using live backend");
                backend
            }
            Err(e) => {
                warn!(channel = %channel, error = %e, "Live backend rejected its settings");
                Arc::new(UnconfiguredChannel::invalid(channel, e.to_string()))
            }
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::channel::{NotificationKind, Outcome};
    use crate::notification::dispatcher::DispatchContext;
    use tempfile::tempdir;

    #[test]
    fn test_builder_defaults_to_simulated() {
        let dispatcher = DispatcherBuilder::new().simulated_delay(Duration::ZERO).build();
        assert_eq!(dispatcher.backend_name(Channel::Email), "simulated-email");
        assert_eq!(dispatcher.backend_name(Channel::Whatsapp), "simulated-whatsapp");
    }

    #[test]
    fn test_live_without_credentials_fails_with_guidance() {
        let temp = tempdir().unwrap();
        let dispatcher = DispatcherBuilder::new()
            .mode(DeliveryMode::Live)
            .audit_log(AuditLog::new(temp.path().join("audit.jsonl")))
            .build();
        assert_eq!(dispatcher.backend_name(Channel::Email), "unconfigured");

        let outcome = dispatcher
            .send(
                Channel::Email,
                "a@b.com",
                Some("s"),
                "b",
                &DispatchContext::new(NotificationKind::Arrears),
            )
            .unwrap();
        match outcome {
            Outcome::Failed(text) => {
                assert!(text.contains("EMAIL_FROM"));
                assert!(text.contains("EMAIL_PASSWORD"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(dispatcher.audit_log().read(5).unwrap().len(), 1);
    }

    #[test]
    fn test_live_with_credentials_uses_provider_backends() {
        let mut settings = Settings::default();
        settings.mode = DeliveryMode::Live;
        settings.email.email_from = "notificaciones@aseguradora.co".to_string();
        settings.email.email_password = "pw".to_string();
        settings.whatsapp.account_sid = "AC1".to_string();
        settings.whatsapp.auth_token = "tok".to_string();
        settings.whatsapp.whatsapp_from = "whatsapp:+14155238886".to_string();

        let dispatcher = DispatcherBuilder::new().settings(settings).build();
        assert_eq!(dispatcher.backend_name(Channel::Email), "smtp");
        assert_eq!(dispatcher.backend_name(Channel::Whatsapp), "twilio");
    }

    #[test]
    fn test_injected_channel_alongside_default_backend() {
        let dispatcher = DispatcherBuilder::new()
            .simulated_delay(Duration::ZERO)
            .email_channel(Arc::new(UnconfiguredChannel::invalid(Channel::Email, "sin servidor")))
            .build();
        assert_eq!(dispatcher.backend_name(Channel::Email), "unconfigured");
        assert_eq!(dispatcher.backend_name(Channel::Whatsapp), "simulated-whatsapp");

        let dispatcher = DispatcherBuilder::new()
            .simulated_delay(Duration::ZERO)
            .whatsapp_channel(Arc::new(UnconfiguredChannel::invalid(Channel::Whatsapp, "sin cuenta")))
            .build();
        assert_eq!(dispatcher.backend_name(Channel::Email), "simulated-email");
        assert_eq!(dispatcher.backend_name(Channel::Whatsapp), "unconfigured");
    }
}
