//! # Backups
//!
//! Point-in-time snapshots of the database file.
//!
//! ```text
//! create_backup ──► VACUUM INTO backups/ricemill_backup_20250301_184500.db
//!                   (consistent even while the POS is writing)
//!
//! restore_database(db, src)
//!     PRAGMA wal_checkpoint(TRUNCATE), close pool
//!     restore_backup(src, dest)
//!         dest, dest-wal ──rename──► dest.before_restore, dest.before_restore-wal
//!         dest-shm removed
//!         src ──copy──► dest.restoring ──rename──► dest
//!
//! export_sql ──► BEGIN; CREATE TABLE ...; INSERT ...; CREATE INDEX/TRIGGER ...; COMMIT;
//! ```
//!
//! The restored file is a new inode at `dest`; handles still open on the
//! old file keep the file that was set aside. Reopen the [`Database`]
//! afterwards.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::DbError;
use crate::migrations::migration_status;
use crate::pool::Database;

const BACKUP_PREFIX: &str = "ricemill_backup_";
const BACKUP_EXT: &str = ".db";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Backup not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a SQLite database: {}", .0.display())]
    InvalidBackup(PathBuf),

    #[error("In-memory database has no file")]
    InMemory,
}

impl From<sqlx::Error> for BackupError {
    fn from(err: sqlx::Error) -> Self {
        BackupError::Db(err.into())
    }
}

pub type BackupResult<T> = Result<T, BackupError>;

/// A backup file found in the backup directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    /// Parsed from the file name (UTC).
    pub created: DateTime<Utc>,
}

/// File name for a backup taken at `at`.
pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("{}{}{}", BACKUP_PREFIX, at.format(TIMESTAMP_FORMAT), BACKUP_EXT)
}

fn parse_backup_name(file_name: &str) -> Option<DateTime<Utc>> {
    let stamp = file_name
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(BACKUP_EXT)?;

    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Writes a consistent snapshot of `db` into `dir`, creating `dir` if needed.
pub async fn create_backup(db: &Database, dir: &Path) -> BackupResult<BackupInfo> {
    if db.path().is_none() {
        return Err(BackupError::InMemory);
    }

    fs::create_dir_all(dir)?;

    let created = Utc::now();
    let file_name = backup_file_name(created);
    let path = dir.join(&file_name);

    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", path.display()),
        )
        .into());
    }

    sqlx::query("VACUUM INTO ?")
        .bind(path.to_string_lossy().into_owned())
        .execute(db.pool())
        .await?;

    let size_bytes = fs::metadata(&path)?.len();
    info!(path = %path.display(), size_bytes, "Backup created");

    Ok(BackupInfo {
        path,
        file_name,
        size_bytes,
        created,
    })
}

/// Backups in `dir`, newest first. Files not named like a backup are ignored.
pub fn list_backups(dir: &Path) -> BackupResult<Vec<BackupInfo>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut backups = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some(created) = parse_backup_name(&file_name) else {
            continue;
        };
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }

        backups.push(BackupInfo {
            path: entry.path(),
            file_name,
            size_bytes: metadata.len(),
            created,
        });
    }

    backups.sort_by(|a, b| b.created.cmp(&a.created));
    Ok(backups)
}

/// Deletes all but the `keep` newest backups. Returns the deleted paths.
pub fn prune_backups(dir: &Path, keep: usize) -> BackupResult<Vec<PathBuf>> {
    let backups = list_backups(dir)?;
    let mut removed = Vec::new();

    for backup in backups.into_iter().skip(keep) {
        fs::remove_file(&backup.path)?;
        info!(path = %backup.path.display(), "Old backup removed");
        removed.push(backup.path);
    }

    Ok(removed)
}

/// `dest` with `suffix` appended to the full file name.
fn sidecar_path(dest: &Path, suffix: &str) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn check_sqlite_file(src: &Path) -> BackupResult<()> {
    if !src.is_file() {
        return Err(BackupError::NotFound(src.to_path_buf()));
    }

    let mut header = [0u8; 16];
    let mut file = fs::File::open(src)?;
    if io::Read::read_exact(&mut file, &mut header).is_err() || &header != SQLITE_HEADER {
        warn!(path = %src.display(), "Restore rejected: not a SQLite file");
        return Err(BackupError::InvalidBackup(src.to_path_buf()));
    }

    Ok(())
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Replaces the file at `dest` with the backup at `src`.
///
/// No pool may have `dest` open; use [`restore_database`] for a live
/// [`Database`]. An existing `dest` (with its WAL) is moved to
/// `<dest>.before_restore`, and that path is returned.
pub fn restore_backup(src: &Path, dest: &Path) -> BackupResult<Option<PathBuf>> {
    check_sqlite_file(src)?;

    let safety = if dest.exists() {
        let safety = sidecar_path(dest, ".before_restore");
        for suffix in ["", "-wal", "-shm"] {
            remove_if_exists(&sidecar_path(&safety, suffix))?;
        }

        fs::rename(dest, &safety)?;
        let wal = sidecar_path(dest, "-wal");
        if wal.exists() {
            fs::rename(&wal, sidecar_path(&safety, "-wal"))?;
        }
        info!(path = %safety.display(), "Current database set aside");
        Some(safety)
    } else {
        None
    };

    // A leftover index would describe the old WAL.
    remove_if_exists(&sidecar_path(dest, "-shm"))?;
    remove_if_exists(&sidecar_path(dest, "-wal"))?;

    let staging = sidecar_path(dest, ".restoring");
    fs::copy(src, &staging)?;
    fs::rename(&staging, dest)?;
    info!(from = %src.display(), to = %dest.display(), "Database restored");

    Ok(safety)
}

/// Checkpoints and closes `db`, then restores its file from `src`.
///
/// `db` and every clone of it are unusable afterwards; open a new
/// [`Database`] on the same path.
pub async fn restore_database(db: Database, src: &Path) -> BackupResult<Option<PathBuf>> {
    let dest = db.path().map(Path::to_path_buf).ok_or(BackupError::InMemory)?;
    check_sqlite_file(src)?;

    sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
        .execute(db.pool())
        .await?;
    db.close().await;

    restore_backup(src, &dest)
}

// =============================================================================
// SQL dump
// =============================================================================

/// File name for an SQL dump taken at `at`.
pub fn dump_file_name(at: DateTime<Utc>) -> String {
    format!("ricemill_dump_{}.sql", at.format(TIMESTAMP_FORMAT))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Writes the schema and every row of `db` as SQL statements that rebuild it
/// in an empty database. Returns the number of rows written.
///
/// Tables come first, then their rows, then indexes and triggers, so the
/// append-only triggers never see the replayed inserts.
pub async fn export_sql<W: Write>(db: &Database, mut out: W) -> BackupResult<usize> {
    let mut tx = db.pool().begin().await?;

    let objects: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT type, name, sql FROM sqlite_master \
         WHERE sql IS NOT NULL AND name NOT LIKE 'sqlite_%' \
         ORDER BY CASE type WHEN 'table' THEN 0 WHEN 'index' THEN 1 ELSE 2 END, rowid",
    )
    .fetch_all(&mut *tx)
    .await?;

    writeln!(out, "PRAGMA foreign_keys=OFF;")?;
    writeln!(out, "BEGIN TRANSACTION;")?;

    let mut rows = 0;
    for (kind, name, sql) in &objects {
        writeln!(out, "{};", sql)?;
        if kind != "table" {
            continue;
        }

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
                .bind(name)
                .fetch_all(&mut *tx)
                .await?;
        if columns.is_empty() {
            continue;
        }

        // quote() renders each value as an SQL literal, blobs included
        let values = columns
            .iter()
            .map(|c| format!("quote({})", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(" || ',' || ");
        let select = format!(
            "SELECT 'INSERT INTO {} VALUES(' || {} || ');' FROM {}",
            quote_ident(name).replace('\'', "''"),
            values,
            quote_ident(name)
        );

        let inserts: Vec<String> = sqlx::query_scalar(&select).fetch_all(&mut *tx).await?;
        for insert in &inserts {
            writeln!(out, "{}", insert)?;
        }
        rows += inserts.len();
    }

    writeln!(out, "COMMIT;")?;
    out.flush()?;
    tx.commit().await?;

    info!(objects = objects.len(), rows, "SQL dump written");
    Ok(rows)
}

/// Row counts and file details for the `--info` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub path: Option<PathBuf>,
    pub size_bytes: Option<u64>,
    pub tables: Vec<(String, i64)>,
    pub active_products: i64,
    pub sales_today: i64,
    pub applied_migrations: usize,
    pub total_migrations: usize,
}

pub async fn database_info(db: &Database) -> BackupResult<DatabaseInfo> {
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(db.pool())
    .await?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        // names come from sqlite_master
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM \"{}\"", name))
            .fetch_one(db.pool())
            .await?;
        tables.push((name, count));
    }

    let active_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
        .fetch_one(db.pool())
        .await?;

    let today = db
        .reports()
        .daily_summary(Utc::now().date_naive())
        .await?;

    let (total_migrations, applied_migrations) = migration_status(db.pool()).await?;

    let size_bytes = match db.path() {
        Some(path) => Some(fs::metadata(path)?.len()),
        None => None,
    };

    Ok(DatabaseInfo {
        path: db.path().map(Path::to_path_buf),
        size_bytes,
        tables,
        active_products,
        sales_today: today.transaction_count,
        applied_migrations,
        total_migrations,
    })
}
