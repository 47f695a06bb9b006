//! Delivery channel trait and the shared notification vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Outbound channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Whatsapp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Whatsapp => "whatsapp",
        }
    }

    /// Human label used in operator-facing text
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Whatsapp => "WhatsApp",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Notification type, persisted as `tipo`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum NotificationKind {
    /// Overdue balance reminder
    #[serde(rename = "cartera")]
    #[value(name = "cartera")]
    Arrears,
    /// Upcoming or past policy expiry
    #[serde(rename = "renovacion")]
    #[value(name = "renovacion")]
    Renewal,
    /// Ad hoc message outside the two fixed templates
    #[serde(rename = "general")]
    #[value(skip)]
    General,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Arrears => "cartera",
            NotificationKind::Renewal => "renovacion",
            NotificationKind::General => "general",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Status recorded for every attempt, persisted as `estado`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[serde(rename = "enviado")]
    Sent,
    #[serde(rename = "fallido")]
    Failed,
    #[serde(rename = "bloqueado")]
    Blocked,
    #[serde(rename = "sin_destinatario")]
    NoContact,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "enviado",
            DeliveryStatus::Failed => "fallido",
            DeliveryStatus::Blocked => "bloqueado",
            DeliveryStatus::NoContact => "sin_destinatario",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Result of one attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Accepted by the provider (or by the simulator)
    Sent,
    /// Configuration or transport failure
    Failed(String),
    /// Contact present but no consent for the channel
    Blocked(String),
    /// No contact data for the channel
    NoContact(String),
}

impl Outcome {
    pub fn status(&self) -> DeliveryStatus {
        match self {
            Outcome::Sent => DeliveryStatus::Sent,
            Outcome::Failed(_) => DeliveryStatus::Failed,
            Outcome::Blocked(_) => DeliveryStatus::Blocked,
            Outcome::NoContact(_) => DeliveryStatus::NoContact,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Sent => None,
            Outcome::Failed(e) | Outcome::Blocked(e) | Outcome::NoContact(e) => Some(e),
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Outcome::Sent)
    }
}

/// Errors a backend can report. Both kinds end up as `Outcome::Failed`.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Transport(String),
}

/// Message handed to a backend
#[derive(Debug, Clone, Copy)]
pub struct OutboundMessage<'a> {
    pub recipient: &'a str,
    pub subject: Option<&'a str>,
    pub body: &'a str,
}

/// Provider backend for one channel
pub trait DeliveryChannel: Send + Sync {
    /// Backend name (for logs)
    fn name(&self) -> &str;

    /// Channel this backend serves
    fn channel(&self) -> Channel;

    /// Deliver synchronously
    fn deliver(&self, message: &OutboundMessage<'_>) -> Result<(), DeliveryError>;
}
