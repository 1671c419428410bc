use crate::events::DomainEvent;
use crate::store::{EventContext, EventSubscriber};
use csv::{Writer, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

/// One row of the activity log file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub event: String,
    pub related_id: String,
    pub user: String,
    pub description: String,
    pub event_json: String,
}

/// Audit trail of every domain event, one CSV row each. Unlike the activity
/// feed this log is append-only and never truncated.
pub struct ActivityLogger {
    writer: Writer<fs::File>,
}

impl ActivityLogger {
    /// Opens `path` for appending; the header row is written only when the
    /// file is new or empty.
    pub fn new(path: &str) -> Result<Self, io::Error> {
        let needs_header = !Path::new(path).exists() || fs::metadata(path)?.len() == 0;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let writer = WriterBuilder::new().has_headers(needs_header).from_writer(file);
        Ok(Self { writer })
    }

    pub fn log_event(&mut self, event: &DomainEvent, context: &EventContext) -> Result<(), anyhow::Error> {
        let entry = LogEntry {
            timestamp: context.timestamp.to_rfc3339(),
            event: event.name().to_string(),
            related_id: event.related_id().unwrap_or_default().to_string(),
            user: context.user.clone(),
            description: event.description(),
            event_json: serde_json::to_string(event)?,
        };

        self.writer.serialize(entry)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl EventSubscriber for ActivityLogger {
    fn on_event(&mut self, event: &DomainEvent, context: &EventContext) -> anyhow::Result<()> {
        self.log_event(event, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pqms_schemas::record::Table;

    fn context() -> EventContext {
        EventContext {
            user: "QA".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 5, 2, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn appends_rows_with_a_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.csv");
        let path = path.to_str().unwrap();
        let event = DomainEvent::RecordDeleted {
            table: Table::Capas,
            id: "capa-1".to_string(),
        };

        ActivityLogger::new(path).unwrap().log_event(&event, &context()).unwrap();
        ActivityLogger::new(path).unwrap().log_event(&event, &context()).unwrap();

        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[1], "event");
        let rows: Vec<LogEntry> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].event, "record_deleted");
        assert_eq!(rows[0].related_id, "capa-1");
        assert_eq!(rows[1].user, "QA");
        assert_eq!(rows[0].timestamp, "2025-05-02T08:30:00+00:00");
    }
}
