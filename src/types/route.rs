//! Route types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RecordId;
use crate::services::coerce::{self, DateStyle};

/// Route record as stored and returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: RouteFields,
}

/// Normalized route fields (everything but the store-assigned id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteFields {
    #[serde(rename = "nomeRota")]
    pub name: Option<String>,
    #[serde(rename = "dataRotaMillis")]
    pub route_date_millis: i64,
    #[serde(rename = "placaCarro")]
    pub license_plate: Option<String>,
    #[serde(rename = "quantidadePacotes")]
    pub package_count: i64,
    /// Loose packages, the input of the monthly metric
    #[serde(rename = "pacotesVulso")]
    pub loose_package_count: i64,
    #[serde(rename = "tipoVeiculo")]
    pub vehicle_type: Option<String>,
    #[serde(rename = "valorCalculado")]
    pub computed_value: Option<f64>,
}

/// Route payload as sent by clients.
///
/// Every field is kept as raw JSON until [`RouteInput::normalize`] settles it.
/// Unknown fields are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteInput {
    #[serde(rename = "nomeRota")]
    pub name: Value,
    #[serde(rename = "dataRota")]
    pub route_date: Value,
    #[serde(rename = "placaCarro")]
    pub license_plate: Value,
    #[serde(rename = "quantidadePacotes")]
    pub package_count: Value,
    #[serde(rename = "pacotesVulso")]
    pub loose_package_count: Value,
    #[serde(rename = "tipoVeiculo")]
    pub vehicle_type: Value,
    #[serde(rename = "valorCalculado")]
    pub computed_value: Value,
}

impl RouteInput {
    /// Lenient conversion used for import entries: anything that is not an
    /// object yields an all-default input
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    pub fn normalize(&self, style: DateStyle, now: DateTime<Utc>) -> RouteFields {
        RouteFields {
            name: coerce::text(&self.name),
            route_date_millis: coerce::date_millis_or(&self.route_date, style, now),
            license_plate: coerce::text(&self.license_plate),
            package_count: coerce::count_or_zero(&self.package_count),
            loose_package_count: coerce::count_or_zero(&self.loose_package_count),
            vehicle_type: coerce::text(&self.vehicle_type),
            computed_value: coerce::number_or_null(&self.computed_value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_route_input_normalizes_client_types() {
        let json = r#"{
            "nomeRota": "Zona Norte",
            "dataRota": "2024-05-20T09:00:00Z",
            "placaCarro": "ABC1D23",
            "quantidadePacotes": "42",
            "pacotesVulso": 3,
            "tipoVeiculo": "van",
            "valorCalculado": "180.5",
            "motorista": "ignored"
        }"#;

        let input: RouteInput = serde_json::from_str(json).unwrap();
        let fields = input.normalize(DateStyle::Local, now());

        assert_eq!(fields.name.as_deref(), Some("Zona Norte"));
        assert_eq!(
            fields.route_date_millis,
            Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap().timestamp_millis()
        );
        assert_eq!(fields.package_count, 42);
        assert_eq!(fields.loose_package_count, 3);
        assert_eq!(fields.computed_value, Some(180.5));
    }

    #[test]
    fn test_route_input_minimal_uses_defaults() {
        let input: RouteInput = serde_json::from_str("{}").unwrap();
        let fields = input.normalize(DateStyle::Local, now());

        assert!(fields.name.is_none());
        assert_eq!(fields.route_date_millis, now().timestamp_millis());
        assert_eq!(fields.package_count, 0);
        assert_eq!(fields.loose_package_count, 0);
        assert!(fields.computed_value.is_none());
    }

    #[test]
    fn test_route_input_from_non_object_is_default() {
        let input = RouteInput::from_value(json!("linha solta"));
        assert!(input.name.is_null());
        assert!(input.route_date.is_null());
    }

    #[test]
    fn test_route_input_from_array_ignores_positions() {
        let input = RouteInput::from_value(json!(["Zona Sul", "2024-01-05", null, 1, 9]));
        let fields = input.normalize(DateStyle::ImportDay, now());

        assert!(fields.name.is_none());
        assert_eq!(fields.route_date_millis, now().timestamp_millis());
        assert_eq!(fields.package_count, 0);
        assert_eq!(fields.loose_package_count, 0);
    }

    #[test]
    fn test_route_record_serializes_flat_wire_names() {
        let record = RouteRecord {
            id: RecordId::Int(7),
            fields: RouteFields {
                name: Some("Centro".to_string()),
                route_date_millis: 1_700_000_000_000,
                license_plate: None,
                package_count: 10,
                loose_package_count: 2,
                vehicle_type: Some("moto".to_string()),
                computed_value: None,
            },
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], json!(7));
        assert_eq!(value["nomeRota"], json!("Centro"));
        assert_eq!(value["dataRotaMillis"], json!(1_700_000_000_000i64));
        assert_eq!(value["pacotesVulso"], json!(2));
        assert_eq!(value["valorCalculado"], json!(null));
    }
}
