//! Live messaging backend - Twilio WhatsApp REST API

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::WhatsappSettings;
use crate::notification::channel::{Channel, DeliveryChannel, DeliveryError, OutboundMessage};

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Twilio error body
#[derive(Deserialize)]
struct TwilioError {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

/// WhatsApp channel through the Twilio Messages API
pub struct TwilioChannel {
    client: reqwest::blocking::Client,
    settings: WhatsappSettings,
    base_url: String,
}

impl TwilioChannel {
    pub fn new(settings: &WhatsappSettings, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Configuration(format!("Cannot create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            settings: settings.clone(),
            base_url: TWILIO_API_BASE.to_string(),
        })
    }

    /// Point the client at another API root (sandbox, proxy)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.base_url,
            self.settings.account_sid.trim()
        )
    }
}

/// Twilio expects `whatsapp:`-prefixed addresses on both ends
fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{}", number)
    }
}

impl DeliveryChannel for TwilioChannel {
    fn name(&self) -> &str {
        "twilio"
    }

    fn channel(&self) -> Channel {
        Channel::Whatsapp
    }

    fn deliver(&self, message: &OutboundMessage<'_>) -> Result<(), DeliveryError> {
        let form = [
            ("To", whatsapp_address(message.recipient)),
            ("From", whatsapp_address(&self.settings.whatsapp_from)),
            ("Body", message.body.to_string()),
        ];

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(self.settings.account_sid.trim(), Some(self.settings.auth_token.trim()))
            .form(&form)
            .send()
            .map_err(|e| DeliveryError::Transport(format!("HTTP request failed: {}", e)))?;
        debug!(elapsed_ms = start.elapsed().as_millis(), "Twilio request completed");

        let status = response.status();
        if status.is_success() {
            info!(channel = "whatsapp", recipient = %message.recipient, "WhatsApp message accepted");
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        let reason = match serde_json::from_str::<TwilioError>(&body) {
            Ok(TwilioError { code: Some(code), message }) => format!("{} (code {})", message, code),
            Ok(TwilioError { code: None, message }) => message,
            Err(_) => body,
        };
        error!(channel = "whatsapp", status = %status, error = %reason, "Twilio rejected message");
        Err(DeliveryError::Transport(format!("Twilio error ({}): {}", status, reason)))
    }
}
