//! Policy Notifier - arrears and renewal notices with consent gating and an audit trail

pub mod cli;
pub mod config;
pub mod notification;
pub mod record;

pub use config::{DeliveryMode, Settings};
pub use notification::{
    AuditEntry, AuditLog, BatchCoordinator, BatchResult, Channel, DeliveryStatus, DispatchContext, Dispatcher,
    DispatcherBuilder, NotificationKind, Outcome,
};
pub use record::{load_records, NotificationRecord};
