use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::records::{NewChild, NewDonation};
use crate::store::migrations::BASE_MIGRATION;
use crate::store::{RecordStore, StoreError};

pub const IN_MEMORY: &str = ":memory:";

const CHILD_COLUMNS: &str = "id, name, age, gender, district, location, education_status, \
     health_status, guardian_name, guardian_phone, special_needs, verified, created_at";

const DONATION_COLUMNS: &str = "id, donor_id, amount, currency, purpose, \
     beneficiary_children_count, status, transaction_id, created_at";

/// Embedded store with the same tables as the hosted backend. Used offline and in tests.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if path == Path::new(IN_MEMORY) {
            return Self::in_memory();
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn migrate(&self) -> Result<(), StoreError> {
        self.lock()?.execute_batch(BASE_MIGRATION)?;
        Ok(())
    }

    /// Stories are curated by staff, so there is no proxy route for them; this feeds demos and tests.
    pub fn insert_success_story(
        &self,
        child_id: &str,
        title: &str,
        description: &str,
        verified: bool,
    ) -> Result<Value, StoreError> {
        let id = Uuid::new_v4().to_string();
        let created_at = timestamp();
        self.lock()?.execute(
            r#"
INSERT INTO success_stories(id, child_id, title, description, image_url, verified, created_at)
VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6)
"#,
            params![id, child_id, title, description, verified, created_at],
        )?;
        Ok(json!({
            "id": id,
            "child_id": child_id,
            "title": title,
            "description": description,
            "image_url": null,
            "verified": verified,
            "created_at": created_at,
        }))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id FROM children LIMIT 1")?;
        let _ = stmt.query_map([], |row| row.get::<_, String>(0))?.count();
        Ok(())
    }

    async fn fetch_children(&self, verified: Option<bool>) -> Result<Vec<Value>, StoreError> {
        let conn = self.lock()?;
        let rows = match verified {
            Some(flag) => {
                let sql = format!(
                    "SELECT {CHILD_COLUMNS} FROM children WHERE verified = ?1 ORDER BY rowid"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![flag], row_to_child)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!("SELECT {CHILD_COLUMNS} FROM children ORDER BY rowid");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], row_to_child)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    }

    async fn fetch_success_stories(&self) -> Result<Vec<Value>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
SELECT s.id, s.child_id, s.title, s.description, s.image_url, s.verified, s.created_at,
       c.name, c.age
FROM success_stories s
LEFT JOIN children c ON c.id = s.child_id
WHERE s.verified = 1
ORDER BY s.created_at DESC, s.rowid DESC
"#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                let child_name: Option<String> = row.get("name")?;
                let child_age: Option<i64> = row.get("age")?;
                let child = match (child_name, child_age) {
                    (Some(name), Some(age)) => json!({ "name": name, "age": age }),
                    _ => Value::Null,
                };
                Ok(json!({
                    "id": row.get::<_, String>("id")?,
                    "child_id": row.get::<_, String>("child_id")?,
                    "title": row.get::<_, String>("title")?,
                    "description": row.get::<_, String>("description")?,
                    "image_url": row.get::<_, Option<String>>("image_url")?,
                    "verified": row.get::<_, bool>("verified")?,
                    "created_at": row.get::<_, String>("created_at")?,
                    "children": child,
                }))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn insert_children(&self, children: &[NewChild]) -> Result<Vec<Value>, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(children.len());
        for child in children {
            let id = Uuid::new_v4().to_string();
            let created_at = timestamp();
            tx.execute(
                r#"
INSERT INTO children(
    id, name, age, gender, district, location, education_status, health_status,
    guardian_name, guardian_phone, special_needs, verified, created_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
"#,
                params![
                    id,
                    child.name,
                    child.age,
                    child.gender.as_str(),
                    child.district,
                    child.location,
                    child.education_status.as_str(),
                    child.health_status.as_str(),
                    child.guardian_name,
                    child.guardian_phone,
                    child.special_needs,
                    child.verified,
                    created_at
                ],
            )?;
            let mut row = serde_json::to_value(child)?;
            if let Value::Object(fields) = &mut row {
                fields.insert("id".to_string(), Value::String(id));
                fields.insert("created_at".to_string(), Value::String(created_at));
            }
            inserted.push(row);
        }
        tx.commit()?;
        Ok(inserted)
    }

    async fn insert_donation(&self, donation: &NewDonation) -> Result<Value, StoreError> {
        let id = Uuid::new_v4().to_string();
        let conn = self.lock()?;
        conn.execute(
            r#"
INSERT INTO donations(
    id, donor_id, amount, currency, purpose, beneficiary_children_count, status, created_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#,
            params![
                id,
                donation.donor_id,
                donation.amount,
                donation.currency,
                donation.purpose,
                donation.beneficiary_children_count,
                donation.status,
                timestamp()
            ],
        )?;
        let sql = format!("SELECT {DONATION_COLUMNS} FROM donations WHERE id = ?1");
        let row = conn.query_row(&sql, params![id], row_to_donation)?;
        Ok(row)
    }

    async fn fetch_donations(&self, donor_id: &str) -> Result<Vec<Value>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE donor_id = ?1 \
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![donor_id], row_to_donation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_child(row: &Row<'_>) -> rusqlite::Result<Value> {
    Ok(json!({
        "id": row.get::<_, String>("id")?,
        "name": row.get::<_, String>("name")?,
        "age": row.get::<_, i64>("age")?,
        "gender": row.get::<_, String>("gender")?,
        "district": row.get::<_, String>("district")?,
        "location": row.get::<_, String>("location")?,
        "education_status": row.get::<_, String>("education_status")?,
        "health_status": row.get::<_, String>("health_status")?,
        "guardian_name": row.get::<_, Option<String>>("guardian_name")?,
        "guardian_phone": row.get::<_, Option<String>>("guardian_phone")?,
        "special_needs": row.get::<_, Option<String>>("special_needs")?,
        "verified": row.get::<_, bool>("verified")?,
        "created_at": row.get::<_, String>("created_at")?,
    }))
}

fn row_to_donation(row: &Row<'_>) -> rusqlite::Result<Value> {
    Ok(json!({
        "id": row.get::<_, String>("id")?,
        "donor_id": row.get::<_, String>("donor_id")?,
        "amount": row.get::<_, f64>("amount")?,
        "currency": row.get::<_, String>("currency")?,
        "purpose": row.get::<_, String>("purpose")?,
        "beneficiary_children_count": row.get::<_, Option<i64>>("beneficiary_children_count")?,
        "status": row.get::<_, String>("status")?,
        "transaction_id": row.get::<_, Option<String>>("transaction_id")?,
        "created_at": row.get::<_, String>("created_at")?,
    }))
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
