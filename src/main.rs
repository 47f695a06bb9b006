//! Policy Notifier CLI
//!
//! Sends arrears and renewal notices by email or WhatsApp and inspects the audit log.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use policy_notifier::cli::{handle_audit, handle_batch, handle_send, AuditArgs, BatchArgs, GlobalArgs, SendArgs};

#[derive(Parser)]
#[command(name = "pnotify")]
#[command(about = "Policy Notifier - avisos de cartera y renovación con trazabilidad")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Notify every record of an export on one channel
    Batch(BatchArgs),
    /// Send one ad hoc message
    Send(SendArgs),
    /// Show audit entries and status counts
    Audit(AuditArgs),
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("policy_notifier=info,pnotify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Batch(args) => handle_batch(args, &cli.global),
        Commands::Send(args) => handle_send(args, &cli.global),
        Commands::Audit(args) => handle_audit(args, &cli.global),
    }
}
