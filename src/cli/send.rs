//! `pnotify send` - one ad hoc message, logged as `general`

use anyhow::Result;
use clap::Args;

use super::GlobalArgs;
use crate::notification::{compose, Channel, ComposedMessage, DispatchContext, NotificationKind, Outcome};
use crate::record::NotificationRecord;

#[derive(Args, Debug)]
pub struct SendArgs {
    #[arg(long, value_enum)]
    pub channel: Channel,

    /// Email address or phone number
    #[arg(long)]
    pub to: String,

    /// Message text; defaults to the courtesy message for the customer
    #[arg(long)]
    pub body: Option<String>,

    /// Email subject (ignored for WhatsApp)
    #[arg(long)]
    pub subject: Option<String>,

    /// Customer name used by the default message
    #[arg(long)]
    pub name: Option<String>,

    /// Customer id recorded in the audit log
    #[arg(long)]
    pub customer_id: Option<String>,

    /// Policy number recorded in the audit log
    #[arg(long)]
    pub policy: Option<String>,

    #[arg(long)]
    pub operator: Option<String>,

    #[arg(long)]
    pub live: bool,
}

impl SendArgs {
    /// Explicit body and subject win over the composed courtesy message
    pub fn message(&self) -> ComposedMessage {
        let record = NotificationRecord {
            customer_name: self.name.clone(),
            policy_number: self.policy.clone(),
            ..Default::default()
        };
        let mut message = compose(&record, NotificationKind::General, self.channel);
        if let Some(body) = &self.body {
            message.body = body.clone();
        }
        if self.channel == Channel::Email {
            if let Some(subject) = &self.subject {
                message.subject = Some(subject.clone());
            }
        }
        message
    }

    pub fn context(&self) -> DispatchContext {
        let mut context = DispatchContext::new(NotificationKind::General);
        if let Some(customer_id) = &self.customer_id {
            context = context.with_customer_id(customer_id.as_str());
        }
        if let Some(policy) = &self.policy {
            context = context.with_policy_id(policy.as_str());
        }
        if let Some(operator) = &self.operator {
            context = context.with_operator(operator.as_str());
        }
        context
    }
}

pub fn handle_send(args: SendArgs, global: &GlobalArgs) -> Result<()> {
    let dispatcher = global.dispatcher(args.live);
    let message = args.message();

    match dispatcher.send(
        args.channel,
        &args.to,
        message.subject.as_deref(),
        &message.body,
        &args.context(),
    )? {
        Outcome::Sent => println!("✅ {} enviado a {}", args.channel.label(), args.to.trim()),
        other => {
            let reason = other.error().unwrap_or("Error desconocido");
            anyhow::bail!("{} no enviado: {}", args.channel.label(), reason);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(channel: Channel) -> SendArgs {
        SendArgs {
            channel,
            to: "ana@example.com".to_string(),
            body: None,
            subject: None,
            name: Some("Ana".to_string()),
            customer_id: Some("C-1".to_string()),
            policy: Some("POL-1".to_string()),
            operator: None,
            live: false,
        }
    }

    #[test]
    fn test_default_message_is_courtesy_text() {
        let message = args(Channel::Email).message();
        assert_eq!(message.subject.as_deref(), Some("Información de tu póliza POL-1"));
        assert_eq!(message.body, "Hola Ana, te escribimos en relación con tu póliza POL-1.");
    }

    #[test]
    fn test_explicit_body_and_subject_win() {
        let mut email = args(Channel::Email);
        email.body = Some("Texto libre".to_string());
        email.subject = Some("Asunto".to_string());
        let message = email.message();
        assert_eq!(message.subject.as_deref(), Some("Asunto"));
        assert_eq!(message.body, "Texto libre");

        let mut whatsapp = args(Channel::Whatsapp);
        whatsapp.subject = Some("Asunto".to_string());
        assert!(whatsapp.message().subject.is_none());
    }

    #[test]
    fn test_context_carries_identifiers() {
        let context = args(Channel::Email).context();
        assert_eq!(context.kind, NotificationKind::General);
        assert_eq!(context.customer_id.as_deref(), Some("C-1"));
        assert_eq!(context.policy_id.as_deref(), Some("POL-1"));
        assert_eq!(context.operator, None);
    }
}
