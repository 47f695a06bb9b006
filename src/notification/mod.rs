//! Notification layer - consent gating, message composition, delivery and audit
//!
//! Every attempt ends in exactly one audit entry, whether it was delivered,
//! failed at the provider, blocked by consent, or had no contact data.
//!
//! # Usage
//! ```ignore
//! use policy_notifier::notification::{BatchCoordinator, Channel, DispatcherBuilder, NotificationKind};
//!
//! let dispatcher = DispatcherBuilder::new().build();
//! let result = BatchCoordinator::new(&dispatcher)
//!     .run(&records, Channel::Email, NotificationKind::Arrears, Some("ops"), None)?;
//! assert!(result.reconciles());
//! ```

pub mod audit;
pub mod batch;
pub mod builder;
pub mod channel;
pub mod channels;
pub mod composer;
pub mod dispatcher;
pub mod resolver;

pub use audit::{AuditEntry, AuditError, AuditFilter, AuditLog, AuditSummary, DEFAULT_LOG_PATH};
pub use batch::{BatchCoordinator, BatchItem, BatchResult};
pub use builder::DispatcherBuilder;
pub use channel::{
    Channel, DeliveryChannel, DeliveryError, DeliveryStatus, NotificationKind, Outcome, OutboundMessage,
};
pub use composer::{compose, ComposedMessage};
pub use dispatcher::{normalize_phone, DispatchContext, Dispatcher};
pub use resolver::{parse_consent, resolve, Eligibility};
