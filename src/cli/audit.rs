//! `pnotify audit` - trazability view over the audit log

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::output::{format_output, render_audit};
use super::GlobalArgs;
use crate::notification::{AuditEntry, AuditFilter, AuditSummary};

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Most recent entries to load before filtering
    #[arg(long, default_value_t = 100)]
    pub limit: usize,

    /// Filter by type (cartera, renovacion, general)
    #[arg(long)]
    pub kind: Option<String>,

    /// Filter by channel (email, whatsapp)
    #[arg(long)]
    pub channel: Option<String>,

    /// Filter by status (enviado, fallido, bloqueado, sin_destinatario)
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct AuditReport<'a> {
    pub summary: AuditSummary,
    pub entries: Vec<&'a AuditEntry>,
}

pub fn handle_audit(args: AuditArgs, global: &GlobalArgs) -> Result<()> {
    let entries = global.audit_log().read(args.limit)?;
    let filter = AuditFilter {
        kind: args.kind,
        channel: args.channel,
        status: args.status,
    };

    let view = filter.apply(&entries);
    let report = AuditReport {
        summary: AuditSummary::from_entries(view.iter().copied()),
        entries: view,
    };

    println!(
        "{}",
        format_output(&report, args.json, |r| render_audit(&r.entries, &r.summary))
    );
    Ok(())
}
