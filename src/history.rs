use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::app_dirs::AppDirs;

/// One completed training session as it lands in the history log.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub finished_at: DateTime<Local>,
    pub preset_name: String,
    pub rounds: u32,
    pub total_intense_secs: u32,
    pub total_normal_secs: u32,
}

impl SessionRecord {
    /// "2 hours ago" style label for the history screen.
    pub fn age_label(&self, now: DateTime<Local>) -> String {
        let secs = (now - self.finished_at).num_seconds().max(0) as u64;
        HumanTime::from(std::time::Duration::from_secs(secs))
            .to_text_en(Accuracy::Rough, Tense::Past)
    }
}

/// Database manager for the session history
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the on-disk database, creating file, directory and schema as
    /// needed.
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("cornerbell_history.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::init(Connection::open(&db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                finished_at TEXT NOT NULL,
                preset_name TEXT NOT NULL,
                rounds INTEGER NOT NULL,
                total_intense_secs INTEGER NOT NULL,
                total_normal_secs INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_finished_at ON sessions(finished_at)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    pub fn record_session(&self, record: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (finished_at, preset_name, rounds, total_intense_secs, total_normal_secs)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.finished_at.to_rfc3339(),
                record.preset_name,
                record.rounds,
                record.total_intense_secs,
                record.total_normal_secs,
            ],
        )?;

        Ok(())
    }

    /// Latest sessions, newest first.
    pub fn recent_sessions(&self, limit: u32) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT finished_at, preset_name, rounds, total_intense_secs, total_normal_secs
            FROM sessions
            ORDER BY finished_at DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit], |row| {
            let finished_str: String = row.get(0)?;
            let finished_at = DateTime::parse_from_rfc3339(&finished_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "finished_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(SessionRecord {
                finished_at,
                preset_name: row.get(1)?,
                rounds: row.get(2)?,
                total_intense_secs: row.get(3)?,
                total_normal_secs: row.get(4)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }

        Ok(sessions)
    }

    pub fn session_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
    }
}

/// Append one row to the plain-text session log, writing the header when the
/// file is first created.
pub fn append_csv_log<P: AsRef<Path>>(path: P, record: &SessionRecord) -> csv::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let fresh = !path.exists();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if fresh {
        writer.write_record(["finished_at", "preset", "rounds", "intense_secs", "normal_secs"])?;
    }
    writer.write_record([
        record.finished_at.to_rfc3339(),
        record.preset_name.clone(),
        record.rounds.to_string(),
        record.total_intense_secs.to_string(),
        record.total_normal_secs.to_string(),
    ])?;
    writer.flush()?;
    Ok(())
}

/// Default location of the session log.
pub fn csv_log_path() -> PathBuf {
    AppDirs::csv_log_path().unwrap_or_else(|| PathBuf::from("cornerbell_sessions.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn record(name: &str, minutes_ago: i64) -> SessionRecord {
        SessionRecord {
            finished_at: Local::now() - Duration::minutes(minutes_ago),
            preset_name: name.to_string(),
            rounds: 3,
            total_intense_secs: 240,
            total_normal_secs: 300,
        }
    }

    #[test]
    fn test_record_and_fetch_newest_first() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record_session(&record("oldest", 90)).unwrap();
        db.record_session(&record("middle", 60)).unwrap();
        db.record_session(&record("newest", 30)).unwrap();

        let sessions = db.recent_sessions(10).unwrap();
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].preset_name, "newest");
        assert_eq!(sessions[2].preset_name, "oldest");
        assert_eq!(sessions[0].rounds, 3);
        assert_eq!(sessions[0].total_intense_secs, 240);
        assert_eq!(db.session_count().unwrap(), 3);
    }

    #[test]
    fn test_recent_sessions_respects_limit() {
        let db = HistoryDb::open_in_memory().unwrap();
        for i in 0..5 {
            db.record_session(&record("s", i * 10)).unwrap();
        }
        assert_eq!(db.recent_sessions(2).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_history() {
        let db = HistoryDb::open_in_memory().unwrap();
        assert!(db.recent_sessions(10).unwrap().is_empty());
        assert_eq!(db.session_count().unwrap(), 0);
    }

    #[test]
    fn test_timestamps_round_trip_timezone() {
        let db = HistoryDb::open_in_memory().unwrap();
        let original = record("tz", 45);
        db.record_session(&original).unwrap();
        let loaded = &db.recent_sessions(1).unwrap()[0];
        assert_eq!(loaded.finished_at, original.finished_at);
    }

    #[test]
    fn test_age_label() {
        let now = Local::now();
        let two_hours = SessionRecord {
            finished_at: now - Duration::hours(2),
            ..record("x", 0)
        };
        assert_eq!(two_hours.age_label(now), "2 hours ago");

        let days = SessionRecord {
            finished_at: now - Duration::days(3),
            ..record("x", 0)
        };
        assert_eq!(days.age_label(now), "3 days ago");
    }

    #[test]
    fn test_csv_log_appends_with_single_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.csv");
        append_csv_log(&path, &record("Morning", 10)).unwrap();
        append_csv_log(&path, &record("Evening", 5)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("finished_at,preset,"));
        assert!(lines[1].contains("Morning"));
        assert!(lines[2].contains("Evening"));
    }
}
