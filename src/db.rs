// 🗄️ Storage - SQLite certificates table + audit trail

use crate::certificate::{Certificate, Customer};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

// ============================================================================
// STORAGE COLLABORATOR
// ============================================================================

/// Where issued certificates live.
///
/// Implementations need not serialize issuance themselves; `CertificateService`
/// holds a lock around "read last number, append".
pub trait CertificateStore: Send + Sync {
    /// Numeric value of the most recently issued certificate, 0 when empty
    fn last_issued_number(&self) -> Result<u32>;

    fn append(&self, certificate: &Certificate) -> Result<()>;

    /// All certificates in issue order
    fn list_all(&self) -> Result<Vec<Certificate>>;

    /// Removes every certificate and its audit events (demo seeding only)
    fn clear(&self) -> Result<()>;
}

// ============================================================================
// AUDIT EVENTS
// ============================================================================

const CERTIFICATE_ENTITY: &str = "certificate";
const ISSUER_ACTOR: &str = "certificate_service";

/// One row of the `events` audit table
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    /// Audit record written alongside every appended certificate
    pub fn certificate_issued(certificate: &Certificate) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: "certificate_issued".to_string(),
            entity_type: CERTIFICATE_ENTITY.to_string(),
            entity_id: certificate.number.clone(),
            data: serde_json::json!({
                "customer_name": certificate.customer.name,
                "insured_sum": certificate.insured_sum.to_string(),
                "certificate_sum": certificate.certificate_sum.to_string(),
                "valid_to": certificate.valid_to.to_rfc3339(),
            }),
            actor: ISSUER_ACTOR.to_string(),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS certificates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            number TEXT UNIQUE NOT NULL,
            creation_date TEXT NOT NULL,
            valid_from TEXT NOT NULL,
            valid_to TEXT NOT NULL,
            customer_name TEXT NOT NULL,
            customer_date_of_birth TEXT NOT NULL,
            insured_item TEXT NOT NULL,
            insured_sum TEXT NOT NULL,
            certificate_sum TEXT NOT NULL
        )",
        [],
    )?;

    // Audit trail
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            serde_json::to_string(&event.data)?,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, oldest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id ASC",
    )?;

    let rows = stmt
        .query_map(params![entity_type, entity_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(event_id, timestamp, event_type, entity_type, entity_id, data, actor)| {
            Ok(Event {
                event_id,
                timestamp: parse_instant(&timestamp)?,
                event_type,
                entity_type,
                entity_id,
                data: serde_json::from_str(&data).context("Failed to parse event data")?,
                actor,
            })
        })
        .collect()
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file in WAL mode
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("Failed to open database: {:?}", path.as_ref()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM certificates", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn events_for_certificate(&self, number: &str) -> Result<Vec<Event>> {
        let conn = self.lock()?;
        get_events_for_entity(&conn, CERTIFICATE_ENTITY, number)
    }
}

impl CertificateStore for SqliteStore {
    fn last_issued_number(&self) -> Result<u32> {
        let conn = self.lock()?;

        let last: Option<String> = conn
            .query_row(
                "SELECT number FROM certificates ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let Some(number) = last else {
            return Ok(0);
        };

        match number.parse::<u32>() {
            Ok(value) => Ok(value),
            Err(_) => {
                let count: u32 =
                    conn.query_row("SELECT COUNT(*) FROM certificates", [], |row| row.get(0))?;
                tracing::warn!(
                    "Last certificate number {:?} is not numeric, falling back to row count {}",
                    number,
                    count
                );
                Ok(count)
            }
        }
    }

    fn append(&self, certificate: &Certificate) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO certificates (
                number, creation_date, valid_from, valid_to,
                customer_name, customer_date_of_birth,
                insured_item, insured_sum, certificate_sum
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                certificate.number,
                certificate.creation_date.to_rfc3339(),
                certificate.valid_from.to_rfc3339(),
                certificate.valid_to.to_rfc3339(),
                certificate.customer.name,
                certificate.customer.date_of_birth.to_string(),
                certificate.insured_item,
                certificate.insured_sum.to_string(),
                certificate.certificate_sum.to_string(),
            ],
        )
        .with_context(|| format!("Failed to append certificate {}", certificate.number))?;

        insert_event(&tx, &Event::certificate_issued(certificate))?;

        tx.commit()?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Certificate>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT number, creation_date, valid_from, valid_to,
                    customer_name, customer_date_of_birth,
                    insured_item, insured_sum, certificate_sum
             FROM certificates
             ORDER BY id ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(CertificateRow {
                    number: row.get(0)?,
                    creation_date: row.get(1)?,
                    valid_from: row.get(2)?,
                    valid_to: row.get(3)?,
                    customer_name: row.get(4)?,
                    customer_date_of_birth: row.get(5)?,
                    insured_item: row.get(6)?,
                    insured_sum: row.get(7)?,
                    certificate_sum: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(CertificateRow::into_certificate).collect()
    }

    fn clear(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM certificates", [])?;
        tx.execute(
            "DELETE FROM events WHERE entity_type = ?1",
            params![CERTIFICATE_ENTITY],
        )?;

        tx.commit()?;
        Ok(())
    }
}

/// Raw text columns, parsed outside the rusqlite row closure
struct CertificateRow {
    number: String,
    creation_date: String,
    valid_from: String,
    valid_to: String,
    customer_name: String,
    customer_date_of_birth: String,
    insured_item: String,
    insured_sum: String,
    certificate_sum: String,
}

impl CertificateRow {
    fn into_certificate(self) -> Result<Certificate> {
        Ok(Certificate {
            creation_date: parse_instant(&self.creation_date)?,
            valid_from: parse_instant(&self.valid_from)?,
            valid_to: parse_instant(&self.valid_to)?,
            customer: Customer {
                name: self.customer_name,
                date_of_birth: NaiveDate::from_str(&self.customer_date_of_birth)
                    .with_context(|| format!("Bad date of birth in certificate {}", self.number))?,
            },
            insured_item: self.insured_item,
            insured_sum: Decimal::from_str(&self.insured_sum)
                .with_context(|| format!("Bad insured sum in certificate {}", self.number))?,
            certificate_sum: Decimal::from_str(&self.certificate_sum)
                .with_context(|| format!("Bad certificate sum in certificate {}", self.number))?,
            number: self.number,
        })
    }
}

fn parse_instant(text: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(text)
        .with_context(|| format!("Bad timestamp: {}", text))?
        .with_timezone(&Utc))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn certificate(number: &str) -> Certificate {
        let created = Utc.with_ymd_and_hms(2022, 9, 1, 14, 30, 0).unwrap();
        Certificate {
            number: number.to_string(),
            creation_date: created,
            valid_from: created,
            valid_to: Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap(),
            customer: Customer {
                name: "Customer 1".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            },
            insured_item: "Apple iPhone 14 PRO".to_string(),
            insured_sum: Decimal::new(15000, 2),
            certificate_sum: Decimal::from(25),
        }
    }

    #[test]
    fn test_empty_store_starts_at_zero() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.last_issued_number().unwrap(), 0);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_list_in_issue_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.append(&certificate("00001")).unwrap();
        store.append(&certificate("00002")).unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], certificate("00001"));
        assert_eq!(all[1].number, "00002");
        assert_eq!(store.last_issued_number().unwrap(), 2);
    }

    #[test]
    fn test_duplicate_number_is_refused() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.append(&certificate("00001")).unwrap();

        assert!(store.append(&certificate("00001")).is_err());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_non_numeric_last_number_falls_back_to_count() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.append(&certificate("00001")).unwrap();
        store.append(&certificate("LEGACY-A")).unwrap();

        assert_eq!(store.last_issued_number().unwrap(), 2);
    }

    #[test]
    fn test_append_records_event() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.append(&certificate("00001")).unwrap();

        let events = store.events_for_certificate("00001").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "certificate_issued");
        assert_eq!(events[0].actor, "certificate_service");
        assert_eq!(events[0].data["certificate_sum"], "25");
    }

    #[test]
    fn test_clear_empties_certificates() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.append(&certificate("00001")).unwrap();
        store.clear().unwrap();

        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.last_issued_number().unwrap(), 0);
    }

    #[test]
    fn test_clear_drops_audit_events_of_removed_certificates() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.append(&certificate("00001")).unwrap();
        store.clear().unwrap();
        assert!(store.events_for_certificate("00001").unwrap().is_empty());

        store.append(&certificate("00001")).unwrap();
        assert_eq!(store.events_for_certificate("00001").unwrap().len(), 1);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("certificates.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.append(&certificate("00007")).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.last_issued_number().unwrap(), 7);
    }

    #[test]
    fn test_event_log() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let event = Event::certificate_issued(&certificate("00042"));
        insert_event(&conn, &event).unwrap();

        let events = get_events_for_entity(&conn, "certificate", "00042").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id, event.event_id);
        assert_eq!(events[0].entity_id, "00042");
        assert_eq!(events[0].data["customer_name"], "Customer 1");
        assert_eq!(events[0].data["insured_sum"], "150.00");
    }
}
