//! Bulk import types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ExpenseFields, ExpenseInput, RouteFields, RouteInput};
use crate::services::coerce::DateStyle;

/// Normalized import batch, ready to be written in chunks
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub routes: Vec<RouteFields>,
    pub expenses: Vec<ExpenseFields>,
}

impl ImportBatch {
    /// Build a batch from the raw `{rotas: [...], despesas: [...]}` payload.
    ///
    /// Returns `None` when the payload is not a JSON object. A missing or
    /// non-array collection counts as empty.
    pub fn from_payload(payload: Value, now: DateTime<Utc>) -> Option<Self> {
        let Value::Object(mut map) = payload else {
            return None;
        };

        let routes = take_array(map.remove("rotas"))
            .into_iter()
            .map(|entry| RouteInput::from_value(entry).normalize(DateStyle::ImportDay, now))
            .collect();
        let expenses = take_array(map.remove("despesas"))
            .into_iter()
            .map(|entry| ExpenseInput::from_value(entry).normalize(DateStyle::ImportDay, now))
            .collect();

        Some(Self { routes, expenses })
    }
}

fn take_array(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Per-kind counts of submitted records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedCounts {
    pub rotas: usize,
    pub despesas: usize,
}

/// Response for a completed import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub ok: bool,
    pub imported: ImportedCounts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_import_batch_rejects_non_objects() {
        let now = Utc::now();
        assert!(ImportBatch::from_payload(json!("not an object"), now).is_none());
        assert!(ImportBatch::from_payload(json!(null), now).is_none());
        assert!(ImportBatch::from_payload(json!([{"nomeRota": "x"}]), now).is_none());
    }

    #[test]
    fn test_import_batch_missing_collections_are_empty() {
        let batch = ImportBatch::from_payload(json!({ "rotas": "nope" }), Utc::now()).unwrap();
        assert!(batch.routes.is_empty());
        assert!(batch.expenses.is_empty());
    }

    #[test]
    fn test_import_batch_uses_utc_days() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let batch = ImportBatch::from_payload(
            json!({
                "rotas": [{ "dataRota": "2024-02-29", "pacotesVulso": "4" }, 17],
                "despesas": [{ "dataDespesa": "garbage", "valor": 30 }]
            }),
            now,
        )
        .unwrap();

        assert_eq!(batch.routes.len(), 2);
        assert_eq!(
            batch.routes[0].route_date_millis,
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap().timestamp_millis()
        );
        assert_eq!(batch.routes[0].loose_package_count, 4);
        assert_eq!(batch.routes[1].route_date_millis, now.timestamp_millis());
        assert_eq!(batch.expenses[0].expense_date_millis, now.timestamp_millis());
        assert_eq!(batch.expenses[0].amount, 30.0);
    }

    #[test]
    fn test_import_batch_array_entries_get_defaults() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let batch = ImportBatch::from_payload(
            json!({
                "rotas": [["Zona Sul", "2024-01-05", null, 1, 9]],
                "despesas": [["Óleo", "2024-01-06", 80]]
            }),
            now,
        )
        .unwrap();

        assert_eq!(batch.routes.len(), 1);
        assert!(batch.routes[0].name.is_none());
        assert_eq!(batch.routes[0].loose_package_count, 0);
        assert_eq!(batch.routes[0].route_date_millis, now.timestamp_millis());
        assert!(batch.expenses[0].description.is_none());
        assert_eq!(batch.expenses[0].amount, 0.0);
    }
}
