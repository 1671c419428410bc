//! Application state and the single place it is changed.
//!
//! `reducer::reduce` is the pure transition function. `Store` owns a state,
//! runs commands through the reducer, fans the resulting events out to
//! subscribers and records them in the activity feed.

pub mod builder;
pub mod reducer;
pub mod state;

use crate::{backup, error::PqmsError, events::DomainEvent};
use chrono::{DateTime, Utc};
use pqms_schemas::{activity::Activity, command::Command, file_formats::CommandFile};
use reducer::{reduce, Transition};
use state::AppState;
use std::{fs, path::Path};
use uuid::Uuid;

/// Who caused an event and when it was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    pub user: String,
    pub timestamp: DateTime<Utc>,
}

/// Receives every event after the state it describes has been committed.
pub trait EventSubscriber {
    fn on_event(&mut self, event: &DomainEvent, context: &EventContext) -> anyhow::Result<()>;
}

/// Reads a YAML file of commands to be dispatched in order.
pub fn read_command_file(path: &Path) -> Result<CommandFile, PqmsError> {
    let name = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| PqmsError::FileIO(name.clone(), e))?;
    serde_yaml::from_str(&content).map_err(|e| PqmsError::YamlParsing(name, e))
}

pub struct Store {
    state: AppState,
    user: String,
    subscribers: Vec<Box<dyn EventSubscriber>>,
}

impl Store {
    /// Applies one command. On error the state is left as it was.
    ///
    /// A subscriber failure is reported after the state has already moved on;
    /// commands are not rolled back.
    pub fn dispatch(&mut self, command: Command) -> Result<Vec<DomainEvent>, PqmsError> {
        let Transition { state, events } = reduce(&self.state, command)?;
        self.state = state;

        let context = EventContext {
            user: self.user.clone(),
            timestamp: Utc::now(),
        };

        for subscriber in self.subscribers.iter_mut() {
            for event in &events {
                subscriber.on_event(event, &context)?;
            }
        }

        for event in &events {
            if let Some(activity_type) = event.activity_type() {
                let activity = Activity {
                    id: Uuid::new_v4().to_string(),
                    activity_type,
                    description: event.description(),
                    user: context.user.clone(),
                    timestamp: context.timestamp,
                    related_id: event.related_id().map(str::to_string),
                };
                self.state = reduce(&self.state, Command::LogActivity { activity })?.state;
            }
        }

        Ok(events)
    }

    /// Applies commands in order, stopping at the first failure. Commands
    /// applied before the failure stay applied.
    pub fn dispatch_all<I>(&mut self, commands: I) -> Result<Vec<DomainEvent>, PqmsError>
    where
        I: IntoIterator<Item = Command>,
    {
        let mut events = Vec::new();
        for command in commands {
            events.extend(self.dispatch(command)?);
        }
        Ok(events)
    }

    pub fn export_json(&self) -> Result<String, PqmsError> {
        backup::export_json(&self.state)
    }

    /// Replaces every table with the contents of a backup. Nothing changes
    /// unless the whole file parses.
    pub fn import_json(&mut self, json: &str) -> Result<Vec<DomainEvent>, PqmsError> {
        let backup = backup::parse_backup(json)?;
        self.dispatch(Command::Restore {
            backup: Box::new(backup),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn into_state(self) -> AppState {
        self.state
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqms_schemas::record::Table;

    #[test]
    fn command_file_parses_tagged_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.yaml");
        fs::write(
            &path,
            "schema_version: \"1.0\"\ncommands:\n  - type: delete\n    table: deviations\n    id: dev-7\n  - type: release_batch\n    batch_id: b1\n",
        )
        .unwrap();

        let file = read_command_file(&path).unwrap();
        assert_eq!(
            file.commands,
            vec![
                Command::Delete {
                    table: Table::Deviations,
                    id: "dev-7".to_string()
                },
                Command::ReleaseBatch {
                    batch_id: "b1".to_string()
                },
            ]
        );
    }

    #[test]
    fn command_file_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "commands: [ { type: teleport } ]").unwrap();
        assert!(matches!(read_command_file(&path), Err(PqmsError::YamlParsing(name, _)) if name.ends_with("broken.yaml")));
        assert!(matches!(
            read_command_file(&dir.path().join("absent.yaml")),
            Err(PqmsError::FileIO(..))
        ));
    }
}
