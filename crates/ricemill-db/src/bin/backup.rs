//! # Backup Utility
//!
//! Snapshot, list, prune and restore database backups.
//!
//! ## Usage
//! ```bash
//! cargo run -p ricemill-db --bin backup -- --backup
//! cargo run -p ricemill-db --bin backup -- --list
//! cargo run -p ricemill-db --bin backup -- --clean 30
//! cargo run -p ricemill-db --bin backup -- --restore backups/ricemill_backup_20250301_184500.db
//! cargo run -p ricemill-db --bin backup -- --info
//! cargo run -p ricemill-db --bin backup -- --export-sql
//! ```
//!
//! Stop the POS before `--restore`.

use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use chrono::Utc;
use ricemill_db::backup::{self, BackupInfo};
use ricemill_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_BACKUP_DIR: &str = "backups";

enum Command {
    Backup,
    List,
    Clean(usize),
    Restore(PathBuf),
    ExportSql,
    Info,
}

fn print_help() {
    println!("Rice Mill POS Backup Utility");
    println!();
    println!("Usage: backup [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  --backup             Create a new backup");
    println!("  --list               List backups, newest first");
    println!("  --clean <N>          Keep only the N most recent backups");
    println!("  --restore <FILE>     Restore the database from FILE");
    println!("  --export-sql         Write an SQL dump into the backup directory");
    println!("  --info               Show database statistics");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>      Database file path (default: $RICEMILL_DB_PATH or ./ricemill.db)");
    println!("      --dir <PATH>     Backup directory (default: ./backups)");
    println!("  -h, --help           Show this help message");
}

fn print_backup(info: &BackupInfo) {
    println!(
        "  {}  {:>10.2} KB  {}",
        info.created.format("%Y-%m-%d %H:%M:%S"),
        info.size_bytes as f64 / 1024.0,
        info.file_name
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = DbConfig::from_env();
    let mut dir = PathBuf::from(DEFAULT_BACKUP_DIR);
    let mut command = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" if i + 1 < args.len() => {
                config = DbConfig::new(&args[i + 1]);
                i += 1;
            }
            "--dir" if i + 1 < args.len() => {
                dir = PathBuf::from(&args[i + 1]);
                i += 1;
            }
            "--backup" => command = Some(Command::Backup),
            "--list" => command = Some(Command::List),
            "--info" => command = Some(Command::Info),
            "--export-sql" => command = Some(Command::ExportSql),
            "--clean" if i + 1 < args.len() => {
                let keep = args[i + 1]
                    .parse()
                    .map_err(|_| format!("--clean expects a number, got '{}'", args[i + 1]))?;
                command = Some(Command::Clean(keep));
                i += 1;
            }
            "--restore" if i + 1 < args.len() => {
                command = Some(Command::Restore(PathBuf::from(&args[i + 1])));
                i += 1;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("Unknown or incomplete option: {}", other);
                print_help();
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let Some(command) = command else {
        print_help();
        return Ok(());
    };

    match command {
        Command::Backup => {
            let db = Database::new(config).await?;
            let info = backup::create_backup(&db, &dir).await?;
            db.close().await;

            println!("✓ Backup created");
            print_backup(&info);
        }
        Command::List => {
            let backups = backup::list_backups(&dir)?;
            if backups.is_empty() {
                println!("No backups in {}", dir.display());
            } else {
                println!("{} backup(s) in {}:", backups.len(), dir.display());
                for info in &backups {
                    print_backup(info);
                }
            }
        }
        Command::Clean(keep) => {
            let removed = backup::prune_backups(&dir, keep)?;
            if removed.is_empty() {
                println!("No cleanup needed.");
            } else {
                for path in &removed {
                    println!("  Removed: {}", path.display());
                }
                println!("✓ Cleanup complete. {} most recent backups retained.", keep);
            }
        }
        Command::Restore(src) => {
            let dest = config.database_path.clone();
            match backup::restore_backup(&src, &dest)? {
                Some(safety) => println!("Current database set aside at: {}", safety.display()),
                None => println!("No existing database at {}", dest.display()),
            }
            println!("✓ Database restored from: {}", src.display());
        }
        Command::ExportSql => {
            std::fs::create_dir_all(&dir)?;
            let path = dir.join(backup::dump_file_name(Utc::now()));

            let db = Database::new(config).await?;
            let rows = backup::export_sql(&db, BufWriter::new(File::create(&path)?)).await?;
            db.close().await;

            let size = std::fs::metadata(&path)?.len();
            println!("✓ SQL dump created");
            println!("  File: {}", path.display());
            println!("  Rows: {}", rows);
            println!("  Size: {:.2} KB", size as f64 / 1024.0);
        }
        Command::Info => {
            let db = Database::new(config).await?;
            let info = backup::database_info(&db).await?;
            db.close().await;

            println!("{}", "=".repeat(60));
            println!("DATABASE INFORMATION");
            println!("{}", "=".repeat(60));
            if let Some(path) = &info.path {
                println!("File: {}", path.display());
            }
            if let Some(size) = info.size_bytes {
                println!("Size: {:.2} MB", size as f64 / (1024.0 * 1024.0));
            }
            println!(
                "Migrations: {}/{} applied",
                info.applied_migrations, info.total_migrations
            );
            println!();
            println!("{:<30} {:>15}", "Table Name", "Row Count");
            println!("{}", "-".repeat(60));
            for (table, count) in &info.tables {
                println!("{:<30} {:>15}", table, count);
            }
            println!("{}", "-".repeat(60));
            println!("Active Products: {}", info.active_products);
            println!("Sales Today: {}", info.sales_today);
        }
    }

    Ok(())
}
