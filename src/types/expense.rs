//! Expense types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RecordId;
use crate::services::coerce::{self, DateStyle};

/// Expense record as stored and returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: ExpenseFields,
}

/// Normalized expense fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseFields {
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "dataDespesaMillis")]
    pub expense_date_millis: i64,
    #[serde(rename = "valor")]
    pub amount: f64,
    #[serde(rename = "categoria")]
    pub category: Option<String>,
}

/// Expense payload as sent by clients
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExpenseInput {
    #[serde(rename = "descricao")]
    pub description: Value,
    #[serde(rename = "dataDespesa")]
    pub expense_date: Value,
    #[serde(rename = "valor")]
    pub amount: Value,
    #[serde(rename = "categoria")]
    pub category: Value,
}

impl ExpenseInput {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    pub fn normalize(&self, style: DateStyle, now: DateTime<Utc>) -> ExpenseFields {
        ExpenseFields {
            description: coerce::text(&self.description),
            expense_date_millis: coerce::date_millis_or(&self.expense_date, style, now),
            amount: coerce::amount_or_zero(&self.amount),
            category: coerce::text(&self.category),
        }
    }
}
