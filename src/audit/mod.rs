//! Audit sink for collected messages
//!
//! Optional append-only text file recording each (order, token) pair as it
//! is collected, for tailing while a drain runs. The handle is owned by the
//! session that opened it; nothing here is process-global, and the file is
//! never read back.

use chrono::Utc;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Append-only audit file for one session
#[derive(Debug)]
pub struct AuditLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl AuditLog {
    /// Create (or truncate) the file and write the session header
    pub fn create(path: &Path, session_id: Uuid) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(
            writer,
            "# session {session_id} started {}",
            Utc::now().to_rfc3339()
        )?;
        writeln!(writer, "# order, token")?;
        writer.flush()?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    /// Append one collected pair
    ///
    /// Flushes per record so the file stays current while the drain runs.
    pub fn record(&mut self, order_index: i64, token: &str) -> io::Result<()> {
        writeln!(self.writer, "{order_index}, {token}")?;
        self.writer.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_pairs_in_collection_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.txt");
        let session_id = Uuid::new_v4();

        let mut audit = AuditLog::create(&path, session_id).unwrap();
        audit.record(2, "world").unwrap();
        audit.record(0, "hello").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains(&session_id.to_string()));
        assert_eq!(lines[1], "# order, token");
        assert_eq!(lines[2], "2, world");
        assert_eq!(lines[3], "0, hello");
    }

    #[test]
    fn test_create_truncates_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.txt");

        let mut first = AuditLog::create(&path, Uuid::new_v4()).unwrap();
        first.record(0, "stale").unwrap();
        drop(first);

        let second = AuditLog::create(&path, Uuid::new_v4()).unwrap();
        assert_eq!(second.path(), path.as_path());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
    }
}
