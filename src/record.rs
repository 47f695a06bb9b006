//! Customer/policy snapshot as supplied by the data layer
//!
//! Records arrive as JSON objects produced from a tabular export, so field
//! names follow either the English names below or the Spanish
//! column names, and loosely-typed cells (numbers for phones, `1.0` for
//! consent flags, `"150000"` for amounts) are accepted.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// Read-only snapshot of one customer/policy row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(default, alias = "id_cliente", deserialize_with = "token")]
    pub customer_id: Option<String>,
    #[serde(default, alias = "numero_poliza", deserialize_with = "token")]
    pub policy_number: Option<String>,
    #[serde(default, alias = "nombre_cliente", deserialize_with = "token")]
    pub customer_name: Option<String>,
    #[serde(default, alias = "email_cliente", deserialize_with = "token")]
    pub email: Option<String>,
    #[serde(default, alias = "telefono_cliente", deserialize_with = "token")]
    pub phone: Option<String>,
    #[serde(default, alias = "consentimiento_email", deserialize_with = "token")]
    pub consent_email: Option<String>,
    #[serde(default, alias = "consentimiento_whatsapp", deserialize_with = "token")]
    pub consent_whatsapp: Option<String>,
    #[serde(default, alias = "valor_en_mora", deserialize_with = "amount")]
    pub arrears_amount: Option<f64>,
    #[serde(default, alias = "fecha_venc_factura", deserialize_with = "token")]
    pub due_date: Option<String>,
    #[serde(default, alias = "link_pago", deserialize_with = "token")]
    pub payment_link: Option<String>,
    #[serde(default, alias = "producto", deserialize_with = "token")]
    pub product: Option<String>,
    #[serde(default, deserialize_with = "token")]
    pub plan: Option<String>,
    #[serde(default, alias = "fecha_fin_vigencia", deserialize_with = "token")]
    pub end_of_validity: Option<String>,
    #[serde(default, alias = "dias_para_vencimiento", deserialize_with = "days")]
    pub days_to_expiry: Option<i64>,
    #[serde(default, alias = "renovable", deserialize_with = "token")]
    pub renewable: Option<String>,
}

impl NotificationRecord {
    pub fn display_name(&self) -> &str {
        non_blank(&self.customer_name).unwrap_or("Cliente")
    }

    pub fn customer_id(&self) -> &str {
        self.customer_id.as_deref().unwrap_or("")
    }

    pub fn policy_number(&self) -> &str {
        self.policy_number.as_deref().unwrap_or("")
    }

    pub fn arrears_amount(&self) -> f64 {
        self.arrears_amount.unwrap_or(0.0)
    }

    pub fn due_date(&self) -> &str {
        self.due_date.as_deref().unwrap_or("")
    }

    pub fn payment_link(&self) -> &str {
        self.payment_link.as_deref().unwrap_or("")
    }

    pub fn product(&self) -> &str {
        self.product.as_deref().unwrap_or("")
    }

    pub fn plan(&self) -> &str {
        self.plan.as_deref().unwrap_or("")
    }

    pub fn end_of_validity(&self) -> &str {
        self.end_of_validity.as_deref().unwrap_or("")
    }

    pub fn days_to_expiry(&self) -> i64 {
        self.days_to_expiry.unwrap_or(0)
    }

    /// Whether the record falls inside a renewal window of `horizon_days`.
    ///
    /// Records without a days-to-expiry value are outside every window.
    /// A missing renewable flag counts as renewable.
    pub fn in_renewal_window(&self, horizon_days: i64) -> bool {
        let Some(days) = self.days_to_expiry else {
            return false;
        };
        if days > horizon_days {
            return false;
        }
        match non_blank(&self.renewable) {
            None => true,
            Some(flag) => matches!(
                flag.trim().to_lowercase().as_str(),
                "true" | "1" | "si" | "sí" | "yes"
            ),
        }
    }
}

/// Load a JSON array of records from disk
pub fn load_records(path: &Path) -> Result<Vec<NotificationRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read records file {}", path.display()))?;
    let records: Vec<NotificationRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid records file {}", path.display()))?;
    Ok(records)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Strings, numbers and booleans all become text; null stays `None`
fn token<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

fn days<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(amount(deserializer)?.map(|v| v.trunc() as i64))
}
