//! Document record store over MongoDB
//!
//! Documents keep the wire field names plus a BSON date (`dataRotaDate`,
//! `dataDespesaDate`) that carries the descending index and all range filters.
//! Documents written by older deployments may lack the millisecond field, so
//! reads fall back to the BSON date.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime, Document};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, info};

use super::{Listing, RecordStore};
use crate::defaults::{EXPENSES_TABLE, ROUTES_TABLE};
use crate::services::month_window::MonthWindow;
use crate::types::{ExpenseFields, ExpenseRecord, RecordId, RouteFields, RouteRecord};

const ROUTE_DATE_FIELD: &str = "dataRotaDate";
const EXPENSE_DATE_FIELD: &str = "dataDespesaDate";

/// MongoDB-backed [`RecordStore`]
pub struct DocumentStore {
    db: Database,
    database_name: String,
}

impl DocumentStore {
    /// Build a client for `url`. The driver connects on first use.
    pub async fn connect(url: &str, database_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(url)
            .await
            .context("invalid MongoDB connection string")?;
        info!("Document store client ready for database '{}'", database_name);

        Ok(Self {
            db: client.database(database_name),
            database_name: database_name.to_string(),
        })
    }

    fn routes(&self) -> Collection<Document> {
        self.db.collection(ROUTES_TABLE)
    }

    fn expenses(&self) -> Collection<Document> {
        self.db.collection(EXPENSES_TABLE)
    }

    async fn find_sorted(
        &self,
        collection: Collection<Document>,
        date_field: &str,
        listing: Listing,
    ) -> Result<Vec<Document>> {
        let filter = match listing {
            Listing::Recent { .. } => doc! {},
            Listing::Month(window) => window_filter(date_field, &window),
        };

        let mut find = collection.find(filter).sort(doc! { date_field: -1 });
        if let Listing::Recent { limit } = listing {
            find = find.limit(limit);
        }

        let docs: Vec<Document> = find.await?.try_collect().await?;
        Ok(docs)
    }
}

fn window_filter(date_field: &str, window: &MonthWindow) -> Document {
    doc! {
        date_field: {
            "$gte": BsonDateTime::from_millis(window.start_millis()),
            "$lte": BsonDateTime::from_millis(window.end_millis()),
        }
    }
}

/// Path ids are ObjectId hex strings here; anything else matches no document
fn parse_object_id(id: &str) -> Option<ObjectId> {
    let parsed = ObjectId::parse_str(id.trim()).ok();
    if parsed.is_none() {
        debug!("Ignoring malformed document id '{}'", id);
    }
    parsed
}

fn route_document(route: &RouteFields) -> Document {
    doc! {
        "nomeRota": route.name.clone(),
        "dataRotaMillis": route.route_date_millis,
        ROUTE_DATE_FIELD: BsonDateTime::from_millis(route.route_date_millis),
        "placaCarro": route.license_plate.clone(),
        "quantidadePacotes": route.package_count,
        "pacotesVulso": route.loose_package_count,
        "tipoVeiculo": route.vehicle_type.clone(),
        "valorCalculado": route.computed_value,
    }
}

fn expense_document(expense: &ExpenseFields) -> Document {
    doc! {
        "descricao": expense.description.clone(),
        "dataDespesaMillis": expense.expense_date_millis,
        EXPENSE_DATE_FIELD: BsonDateTime::from_millis(expense.expense_date_millis),
        "valor": expense.amount,
        "categoria": expense.category.clone(),
    }
}

fn text_field(doc: &Document, key: &str) -> Option<String> {
    match doc.get(key)? {
        Bson::String(s) => Some(s.clone()),
        Bson::Int32(n) => Some(n.to_string()),
        Bson::Int64(n) => Some(n.to_string()),
        Bson::Double(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(doc: &Document, key: &str) -> Option<f64> {
    match doc.get(key)? {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) if n.is_finite() => Some(*n),
        Bson::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn integer_field(doc: &Document, key: &str) -> Option<i64> {
    match doc.get(key)? {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        _ => number_field(doc, key).map(|n| n.trunc() as i64),
    }
}

fn date_millis(doc: &Document, millis_key: &str, date_key: &str) -> i64 {
    integer_field(doc, millis_key)
        .or_else(|| match doc.get(date_key) {
            Some(Bson::DateTime(dt)) => Some(dt.timestamp_millis()),
            _ => None,
        })
        .unwrap_or_default()
}

fn document_id(doc: &Document) -> RecordId {
    match doc.get("_id") {
        Some(Bson::ObjectId(oid)) => RecordId::Text(oid.to_hex()),
        Some(Bson::Int32(n)) => RecordId::Int(i64::from(*n)),
        Some(Bson::Int64(n)) => RecordId::Int(*n),
        Some(Bson::String(s)) => RecordId::Text(s.clone()),
        Some(other) => RecordId::Text(other.to_string()),
        None => RecordId::Text(String::new()),
    }
}

fn route_from_document(doc: &Document) -> RouteRecord {
    RouteRecord {
        id: document_id(doc),
        fields: RouteFields {
            name: text_field(doc, "nomeRota"),
            route_date_millis: date_millis(doc, "dataRotaMillis", ROUTE_DATE_FIELD),
            license_plate: text_field(doc, "placaCarro"),
            package_count: integer_field(doc, "quantidadePacotes").unwrap_or_default(),
            loose_package_count: integer_field(doc, "pacotesVulso").unwrap_or_default(),
            vehicle_type: text_field(doc, "tipoVeiculo"),
            computed_value: number_field(doc, "valorCalculado"),
        },
    }
}

fn expense_from_document(doc: &Document) -> ExpenseRecord {
    ExpenseRecord {
        id: document_id(doc),
        fields: ExpenseFields {
            description: text_field(doc, "descricao"),
            expense_date_millis: date_millis(doc, "dataDespesaMillis", EXPENSE_DATE_FIELD),
            amount: number_field(doc, "valor").unwrap_or_default(),
            category: text_field(doc, "categoria"),
        },
    }
}

fn inserted_id(id: &Bson) -> RecordId {
    match id {
        Bson::ObjectId(oid) => RecordId::Text(oid.to_hex()),
        Bson::Int64(n) => RecordId::Int(*n),
        Bson::Int32(n) => RecordId::Int(i64::from(*n)),
        other => RecordId::Text(other.to_string()),
    }
}

#[async_trait]
impl RecordStore for DocumentStore {
    fn name(&self) -> &'static str {
        "document"
    }

    fn database_name(&self) -> &str {
        &self.database_name
    }

    async fn ensure_schema(&self) -> Result<()> {
        let existing = self.db.list_collection_names().await?;
        for name in [ROUTES_TABLE, EXPENSES_TABLE] {
            if !existing.iter().any(|c| c == name) {
                self.db.create_collection(name).await?;
                info!("Created collection '{}'", name);
            }
        }

        self.routes()
            .create_index(IndexModel::builder().keys(doc! { ROUTE_DATE_FIELD: -1 }).build())
            .await?;
        self.expenses()
            .create_index(IndexModel::builder().keys(doc! { EXPENSE_DATE_FIELD: -1 }).build())
            .await?;

        Ok(())
    }

    async fn collections(&self) -> Result<Vec<String>> {
        let mut names = self.db.list_collection_names().await?;
        names.sort();
        Ok(names)
    }

    async fn create_route(&self, route: &RouteFields) -> Result<RouteRecord> {
        let result = self.routes().insert_one(route_document(route)).await?;
        Ok(RouteRecord {
            id: inserted_id(&result.inserted_id),
            fields: route.clone(),
        })
    }

    async fn list_routes(&self, listing: Listing) -> Result<Vec<RouteRecord>> {
        let docs = self.find_sorted(self.routes(), ROUTE_DATE_FIELD, listing).await?;
        Ok(docs.iter().map(route_from_document).collect())
    }

    async fn update_route(&self, id: &str, route: &RouteFields) -> Result<u64> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(0);
        };
        let result = self
            .routes()
            .update_one(doc! { "_id": oid }, doc! { "$set": route_document(route) })
            .await?;
        Ok(result.matched_count)
    }

    async fn delete_route(&self, id: &str) -> Result<u64> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(0);
        };
        let result = self.routes().delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count)
    }

    async fn create_expense(&self, expense: &ExpenseFields) -> Result<ExpenseRecord> {
        let result = self.expenses().insert_one(expense_document(expense)).await?;
        Ok(ExpenseRecord {
            id: inserted_id(&result.inserted_id),
            fields: expense.clone(),
        })
    }

    async fn list_expenses(&self, listing: Listing) -> Result<Vec<ExpenseRecord>> {
        let docs = self.find_sorted(self.expenses(), EXPENSE_DATE_FIELD, listing).await?;
        Ok(docs.iter().map(expense_from_document).collect())
    }

    async fn update_expense(&self, id: &str, expense: &ExpenseFields) -> Result<u64> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(0);
        };
        let result = self
            .expenses()
            .update_one(doc! { "_id": oid }, doc! { "$set": expense_document(expense) })
            .await?;
        Ok(result.matched_count)
    }

    async fn delete_expense(&self, id: &str) -> Result<u64> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(0);
        };
        let result = self.expenses().delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count)
    }

    async fn sum_loose_packages(&self, window: &MonthWindow) -> Result<f64> {
        let pipeline = vec![
            doc! { "$match": window_filter(ROUTE_DATE_FIELD, window) },
            doc! {
                "$group": {
                    "_id": Bson::Null,
                    "totalPacotes": { "$sum": { "$ifNull": ["$pacotesVulso", 0] } },
                }
            },
        ];

        let mut cursor = self.routes().aggregate(pipeline).await?;
        let total = match cursor.try_next().await? {
            Some(group) => number_field(&group, "totalPacotes").unwrap_or_default(),
            None => 0.0,
        };
        Ok(total)
    }

    async fn insert_route_batch(&self, routes: &[RouteFields]) -> Result<()> {
        if routes.is_empty() {
            return Ok(());
        }
        self.routes()
            .insert_many(routes.iter().map(route_document))
            .await?;
        Ok(())
    }

    async fn insert_expense_batch(&self, expenses: &[ExpenseFields]) -> Result<()> {
        if expenses.is_empty() {
            return Ok(());
        }
        self.expenses()
            .insert_many(expenses.iter().map(expense_document))
            .await?;
        Ok(())
    }
}
