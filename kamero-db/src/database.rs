//! The license row and the business-data reset.

use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use kamero_license::{
    ActivationCommit, BusinessDataReset, IssueOutcome, LicenseRecord, LicenseResult, LicenseStore,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Primary key of the singleton license row.
///
/// Kept identical to the id existing installations were seeded with.
pub const LICENSE_ROW_ID: &str = "cm9et8sj10002i5q07ag76le2";

/// Site name restored when business data is reset.
pub const DEFAULT_SITE_NAME: &str = "Kamero Stock Management";

/// Host tables emptied when a new key is issued.
pub const BUSINESS_TABLES: [&str; 7] = [
    "products",
    "orders",
    "purchase_orders",
    "customers",
    "categories",
    "report",
    "notification",
];

const SETTINGS_TABLE: &str = "settings";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed license store.
///
/// `created_at` holds the activation deadline. The column name predates its
/// current meaning and is kept so existing databases open unchanged.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    default_site_name: String,
}

impl Database {
    /// Opens (or creates) a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> DbResult<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            default_site_name: DEFAULT_SITE_NAME.to_string(),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Sets the site name written back by the business-data reset.
    #[must_use]
    pub fn with_default_site_name(mut self, name: impl Into<String>) -> Self {
        self.default_site_name = name.into();
        self
    }

    /// Runs `f` against the underlying connection.
    ///
    /// Lets the host application manage its own tables in the same file.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> DbResult<T> {
        let conn = self.conn()?;
        Ok(f(&*conn)?)
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn init_schema(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS product_key (
                id TEXT PRIMARY KEY,
                "key" TEXT UNIQUE,
                app_id TEXT,
                created_at INTEGER NOT NULL,
                used INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )?;
        let seeded = conn.execute(
            "INSERT OR IGNORE INTO product_key (id, created_at, used) VALUES (?1, ?2, 0)",
            params![LICENSE_ROW_ID, Utc::now().timestamp_millis()],
        )?;
        if seeded == 1 {
            info!("seeded license row");
        }
        Ok(())
    }

    fn immediate(conn: &mut Connection) -> DbResult<Transaction<'_>> {
        Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    fn load_record(conn: &Connection) -> DbResult<LicenseRecord> {
        let row = conn
            .query_row(
                r#"SELECT "key", app_id, created_at, used FROM product_key WHERE id = ?1"#,
                params![LICENSE_ROW_ID],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, bool>(3)?,
                    ))
                },
            )
            .optional()?;

        let (key, bound_device_id, expires_ms, activated) =
            row.ok_or_else(|| DbError::MissingRecord(LICENSE_ROW_ID.to_string()))?;
        Ok(LicenseRecord {
            key,
            bound_device_id,
            expires_at: from_millis(expires_ms)?,
            activated,
        })
    }

    fn try_issue(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
        device_id: &str,
    ) -> DbResult<IssueOutcome> {
        let mut conn = self.conn()?;
        let tx = Self::immediate(&mut conn)?;

        let rebound = tx.execute(
            r#"UPDATE product_key SET app_id = ?2 WHERE id = ?1 AND "key" = ?3"#,
            params![LICENSE_ROW_ID, device_id, key],
        )?;

        let outcome = if rebound == 1 {
            let record = Self::load_record(&tx)?;
            IssueOutcome::Rebound {
                expires_at: record.expires_at,
            }
        } else {
            let previous = Self::load_record(&tx)?;
            let expires_ms = expires_at.timestamp_millis();
            let replaced = tx.execute(
                r#"UPDATE product_key SET "key" = ?2, created_at = ?3, used = 0, app_id = ?4
                   WHERE id = ?1"#,
                params![LICENSE_ROW_ID, key, expires_ms, device_id],
            )?;
            if replaced == 0 {
                return Err(DbError::MissingRecord(LICENSE_ROW_ID.to_string()));
            }
            IssueOutcome::Issued {
                expires_at: from_millis(expires_ms)?,
                replaced: previous,
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn try_activate(&self, key: &str, now: DateTime<Utc>) -> DbResult<ActivationCommit> {
        let mut conn = self.conn()?;
        let tx = Self::immediate(&mut conn)?;

        let activated = tx.execute(
            r#"UPDATE product_key SET used = 1
               WHERE id = ?1 AND "key" = ?2 AND created_at >= ?3"#,
            params![LICENSE_ROW_ID, key, millis_rounded_up(now)],
        )?;
        let record = Self::load_record(&tx)?;
        tx.commit()?;

        let expires_at = record.expires_at;
        Ok(if activated == 1 {
            ActivationCommit::Activated { expires_at }
        } else if record.key.as_deref() != Some(key) {
            ActivationCommit::UnknownKey
        } else {
            ActivationCommit::Expired { expires_at }
        })
    }

    fn try_invalidate(&self, device_id: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE product_key SET used = 0 WHERE id = ?1 AND app_id IS NOT ?2",
            params![LICENSE_ROW_ID, device_id],
        )?;
        Ok(changed == 1)
    }

    fn try_revert(&self, key: &str, previous: &LicenseRecord) -> DbResult<bool> {
        let conn = self.conn()?;
        let reverted = conn.execute(
            r#"UPDATE product_key SET "key" = ?3, app_id = ?4, created_at = ?5, used = ?6
               WHERE id = ?1 AND "key" = ?2"#,
            params![
                LICENSE_ROW_ID,
                key,
                previous.key,
                previous.bound_device_id,
                previous.expires_at.timestamp_millis(),
                previous.activated,
            ],
        )?;
        Ok(reverted == 1)
    }

    fn try_reset(&self) -> DbResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut cleared = 0;
        for table in BUSINESS_TABLES {
            if table_exists(&tx, table)? {
                let rows = tx.execute(&format!("DELETE FROM {table}"), [])?;
                debug!(table, rows, "cleared business table");
                cleared += 1;
            }
        }
        if table_exists(&tx, SETTINGS_TABLE)? {
            tx.execute(
                &format!("UPDATE {SETTINGS_TABLE} SET site_name = ?1"),
                params![self.default_site_name],
            )?;
        }

        tx.commit()?;
        Ok(cleared)
    }
}

impl LicenseStore for Database {
    fn load(&self) -> LicenseResult<LicenseRecord> {
        let conn = self.conn()?;
        Ok(Self::load_record(&conn)?)
    }

    fn issue(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
        device_id: &str,
    ) -> LicenseResult<IssueOutcome> {
        Ok(self.try_issue(key, expires_at, device_id)?)
    }

    fn activate(&self, key: &str, now: DateTime<Utc>) -> LicenseResult<ActivationCommit> {
        Ok(self.try_activate(key, now)?)
    }

    fn invalidate_unless_bound_to(&self, device_id: &str) -> LicenseResult<bool> {
        Ok(self.try_invalidate(device_id)?)
    }

    fn revert_issue(&self, key: &str, previous: &LicenseRecord) -> LicenseResult<bool> {
        Ok(self.try_revert(key, previous)?)
    }
}

impl BusinessDataReset for Database {
    fn reset_business_data(&self) -> LicenseResult<()> {
        let cleared = self.try_reset()?;
        info!(tables = cleared, "business data reset for new license");
        Ok(())
    }
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Deadlines are stored in whole milliseconds; rounding `now` up keeps
/// `now > deadline` exact when `now` has a sub-millisecond part.
fn millis_rounded_up(now: DateTime<Utc>) -> i64 {
    let ms = now.timestamp_millis();
    if now.timestamp_subsec_nanos() % 1_000_000 == 0 {
        ms
    } else {
        ms + 1
    }
}

fn from_millis(ms: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| DbError::InvalidData(format!("timestamp out of range: {ms}")))
}
