//! CLI command handling

pub mod audit;
pub mod batch;
pub mod output;
pub mod send;

pub use audit::*;
pub use batch::*;
pub use output::*;
pub use send::*;

use clap::Args;
use std::path::PathBuf;

use crate::config::{DeliveryMode, Settings};
use crate::notification::{AuditLog, Dispatcher, DispatcherBuilder, DEFAULT_LOG_PATH};

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Audit log file (JSON Lines)
    #[arg(long, global = true, default_value = DEFAULT_LOG_PATH)]
    pub log: PathBuf,

    /// Secrets file (JSON); defaults to the user config directory
    #[arg(long, global = true)]
    pub secrets: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn audit_log(&self) -> AuditLog {
        AuditLog::new(self.log.clone())
    }

    /// Resolve settings once and build the dispatcher; `--live` overrides the configured mode
    pub fn dispatcher(&self, live: bool) -> Dispatcher {
        let settings = Settings::resolve(self.secrets.as_deref());
        let mut builder = DispatcherBuilder::new()
            .settings(settings)
            .audit_log(self.audit_log());
        if live {
            builder = builder.mode(DeliveryMode::Live);
        }
        builder.build()
    }
}
