//! `pnotify batch` - notify a record export on one channel

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::output::{format_output, render_batch};
use super::GlobalArgs;
use crate::notification::{BatchCoordinator, Channel, NotificationKind};
use crate::record::load_records;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON array of customer/policy records
    #[arg(long)]
    pub records: PathBuf,

    #[arg(long, value_enum)]
    pub channel: Channel,

    #[arg(long, value_enum)]
    pub kind: NotificationKind,

    /// Operator recorded in the audit log
    #[arg(long)]
    pub operator: Option<String>,

    /// Deliver through the real providers
    #[arg(long)]
    pub live: bool,

    /// Renewal only: keep records expiring within this many days
    #[arg(long)]
    pub window: Option<i64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_batch(args: BatchArgs, global: &GlobalArgs) -> Result<()> {
    let mut records = load_records(&args.records)?;

    if let Some(window) = args.window {
        if args.kind != NotificationKind::Renewal {
            bail!("--window solo aplica a notificaciones de renovación");
        }
        let before = records.len();
        records.retain(|r| r.in_renewal_window(window));
        info!(window, before, after = records.len(), "Applied renewal window");
    }

    let dispatcher = global.dispatcher(args.live);
    let mut progress = |done: usize, total: usize| eprintln!("Procesados {}/{}", done, total);
    let result = BatchCoordinator::new(&dispatcher).run(
        &records,
        args.channel,
        args.kind,
        args.operator.as_deref(),
        Some(&mut progress),
    )?;

    println!("{}", format_output(&result, args.json, render_batch));
    Ok(())
}
