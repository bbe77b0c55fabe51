//! Database initialization, table definitions and document operations.
//!
//! Each collection lives in its own redb table. Records are stored as
//! JSON-serialized documents keyed by a random alphanumeric id, the same
//! shape the API exchanges on the wire. All storage round trips go
//! through the functions in this module.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, Rng};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::ApiError;
use crate::media::MediaHost;
use crate::model::{Stats, STAT_FIELDS};

/// JSON-document table: key is the document id, value the serialized
/// document.
pub type DocTable = TableDefinition<'static, &'static str, &'static str>;

pub const TABLE_HOME_CONTENT: DocTable = TableDefinition::new("home_content_v1");
pub const TABLE_HOME_COURSES: DocTable = TableDefinition::new("home_courses_v1");
pub const TABLE_HOME_SERVICES: DocTable = TableDefinition::new("home_services_v1");
pub const TABLE_SERVICE_CONTENT: DocTable = TableDefinition::new("service_content_v1");
pub const TABLE_CAREERS: DocTable = TableDefinition::new("careers_v1");
pub const TABLE_CONTACTS: DocTable = TableDefinition::new("contacts_v1");
pub const TABLE_ENROLLMENTS: DocTable = TableDefinition::new("enrollments_v1");
pub const TABLE_ENROLL_COURSES: DocTable = TableDefinition::new("enroll_courses_v1");

/// Singleton table holding the aggregate counters under one fixed key.
pub const TABLE_STATS: DocTable = TableDefinition::new("stats_v1");

const STATS_KEY: &str = "singleton";

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe reference to the embedded database.
    pub db: Arc<Database>,
    /// External image host, swappable for an in-memory stand-in.
    pub media: Arc<dyn MediaHost>,
    pub config: Arc<Config>,
}

/// Create or open the database file and make sure every table exists, so
/// later read transactions never race table creation.
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_HOME_CONTENT)?;
        write_txn.open_table(TABLE_HOME_COURSES)?;
        write_txn.open_table(TABLE_HOME_SERVICES)?;
        write_txn.open_table(TABLE_SERVICE_CONTENT)?;
        write_txn.open_table(TABLE_CAREERS)?;
        write_txn.open_table(TABLE_CONTACTS)?;
        write_txn.open_table(TABLE_ENROLLMENTS)?;
        write_txn.open_table(TABLE_ENROLL_COURSES)?;
        write_txn.open_table(TABLE_STATS)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// Random 12-character alphanumeric document id.
pub fn new_doc_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

/// Insert or overwrite a document.
pub fn put_document(db: &Database, table: DocTable, id: &str, doc: &Value) -> Result<(), ApiError> {
    let encoded = serde_json::to_string(doc)?;

    let write_txn = db.begin_write()?;
    {
        let mut records = write_txn.open_table(table)?;
        records.insert(id, encoded.as_str())?;
    }
    write_txn.commit()?;
    Ok(())
}

/// All documents of a collection, newest first. An empty collection is an
/// empty vector, never an error.
pub fn list_documents(db: &Database, table: DocTable) -> Result<Vec<Value>, ApiError> {
    let read_txn = db.begin_read()?;
    let records = read_txn.open_table(table)?;

    let mut documents = Vec::new();
    for entry in records.iter()? {
        let (_, value) = entry?;
        documents.push(serde_json::from_str::<Value>(value.value())?);
    }

    // Ties broken by id so the order is stable.
    documents.sort_by(|a, b| {
        created_at(b)
            .cmp(&created_at(a))
            .then_with(|| doc_id(b).cmp(&doc_id(a)))
    });
    Ok(documents)
}

pub fn get_document(db: &Database, table: DocTable, id: &str) -> Result<Option<Value>, ApiError> {
    let read_txn = db.begin_read()?;
    let records = read_txn.open_table(table)?;
    match records.get(id)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    }
}

/// Remove a document; `false` when the id had no match.
pub fn delete_document(db: &Database, table: DocTable, id: &str) -> Result<bool, ApiError> {
    let write_txn = db.begin_write()?;
    let removed;
    {
        let mut records = write_txn.open_table(table)?;
        removed = records.remove(id)?.is_some();
    }
    write_txn.commit()?;
    Ok(removed)
}

pub fn count_documents(db: &Database, table: DocTable) -> Result<u64, ApiError> {
    let read_txn = db.begin_read()?;
    let records = read_txn.open_table(table)?;
    let mut count = 0u64;
    for entry in records.iter()? {
        entry?;
        count += 1;
    }
    Ok(count)
}

/// Read the stats singleton, seeding it on first access so a second read
/// sees the same values.
pub fn load_stats(db: &Database) -> Result<Stats, ApiError> {
    {
        let read_txn = db.begin_read()?;
        let records = read_txn.open_table(TABLE_STATS)?;
        if let Some(guard) = records.get(STATS_KEY)? {
            return Ok(serde_json::from_str(guard.value())?);
        }
    }

    let seed = Stats::seed();
    let write_txn = db.begin_write()?;
    let existing = {
        let mut records = write_txn.open_table(TABLE_STATS)?;
        // A concurrent request may have seeded between the two transactions.
        let current = match records.get(STATS_KEY)? {
            Some(guard) => Some(serde_json::from_str::<Stats>(guard.value())?),
            None => None,
        };
        if current.is_none() {
            records.insert(STATS_KEY, serde_json::to_string(&seed)?.as_str())?;
        }
        current
    };
    write_txn.commit()?;
    Ok(existing.unwrap_or(seed))
}

/// Overwrite the supplied counters on the singleton, creating it with
/// exactly those fields when absent. Keys outside the known counters are
/// dropped.
pub fn merge_stats(db: &Database, updates: &Map<String, Value>) -> Result<Stats, ApiError> {
    let write_txn = db.begin_write()?;
    let merged = {
        let mut records = write_txn.open_table(TABLE_STATS)?;
        let mut doc = match records.get(STATS_KEY)? {
            Some(guard) => serde_json::from_str::<Map<String, Value>>(guard.value())?,
            None => Map::new(),
        };
        for (key, value) in updates {
            if STAT_FIELDS.contains(&key.as_str()) {
                doc.insert(key.clone(), value.clone());
            }
        }
        records.insert(STATS_KEY, serde_json::to_string(&doc)?.as_str())?;
        doc
    };
    write_txn.commit()?;
    Ok(serde_json::from_value(Value::Object(merged))?)
}

/// Bump the customer counter after an enrollment is stored. Find-or-create
/// and increment run inside a single write transaction, so concurrent
/// enrollments cannot lose increments. The enrollment itself has already
/// committed; a failure here leaves it standing.
pub fn record_enrollment(db: &Database) -> Result<(), ApiError> {
    let write_txn = db.begin_write()?;
    {
        let mut records = write_txn.open_table(TABLE_STATS)?;
        let mut doc = match records.get(STATS_KEY)? {
            Some(guard) => serde_json::from_str::<Map<String, Value>>(guard.value())?,
            None => match serde_json::to_value(Stats::seed())? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        };
        let current = doc
            .get("customerCount")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        doc.insert("customerCount".to_string(), Value::from(current + 1));
        records.insert(STATS_KEY, serde_json::to_string(&doc)?.as_str())?;
    }
    write_txn.commit()?;
    Ok(())
}

/// Liveness probe for the health endpoint.
pub fn store_ready(db: &Database) -> bool {
    db.begin_read().is_ok()
}

fn created_at(doc: &Value) -> DateTime<Utc> {
    doc.get("createdAt")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn doc_id(doc: &Value) -> &str {
    doc.get("id").and_then(Value::as_str).unwrap_or("")
}
