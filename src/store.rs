use std::collections::HashSet;

use anyhow::{Context, Result};
use serde_json::Value;
use time::Date;

use crate::domain::clock::{Clock, SystemClock};
use crate::domain::task::{Task, TaskId};
use crate::repo::KeyValueStore;

pub const TASKS_KEY: &str = "tasks";

/// Authoritative task list, newest first, mirrored to `TASKS_KEY` after
/// every mutation.
pub struct TaskStore<R: KeyValueStore, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    tasks: Vec<Task>,
    // Highest id ever handed out or loaded; survives removals.
    last_id: Option<TaskId>,
}

impl<R: KeyValueStore, C: Clock> TaskStore<R, C> {
    pub fn load(repo: R, clock: C) -> Result<Self> {
        let raw = repo.get(TASKS_KEY).context("failed to read persisted tasks")?;
        let tasks = raw.as_deref().map(decode_tasks).unwrap_or_default();
        let last_id = tasks.iter().map(|t| t.id).max();
        tracing::info!(count = tasks.len(), "loaded tasks");
        Ok(Self {
            repo,
            clock,
            tasks,
            last_id,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn today(&self) -> Date {
        self.clock.today()
    }

    #[cfg(test)]
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    /// Prepends a new pending task dated today. Blank text is ignored.
    pub fn add(&mut self, text: &str) -> Result<Option<Task>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let task = Task::new(self.next_id(), text, self.clock.today());
        self.tasks.insert(0, task.clone());
        self.persist()?;
        tracing::info!(id = task.id, date = %task.date, "added task");
        Ok(Some(task))
    }

    pub fn toggle(&mut self, id: TaskId) -> Result<Option<Task>> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.completed = !task.completed;
        let task = task.clone();
        self.persist()?;
        tracing::info!(id, completed = task.completed, "toggled task");
        Ok(Some(task))
    }

    pub fn remove(&mut self, id: TaskId) -> Result<Option<Task>> {
        let Some(pos) = self.tasks.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        let task = self.tasks.remove(pos);
        self.persist()?;
        tracing::info!(id, "removed task");
        Ok(Some(task))
    }

    /// Overwrites the persisted list with the full in-memory list.
    pub fn persist(&mut self) -> Result<()> {
        let encoded = serde_json::to_string(&self.tasks).context("failed to encode tasks")?;
        self.repo
            .set(TASKS_KEY, &encoded)
            .context("failed to persist tasks")
    }

    // Millisecond timestamp, bumped past every id handed out so far so ids
    // stay unique and increasing, even after the newest task is removed.
    fn next_id(&mut self) -> TaskId {
        let now = self.clock.now_millis();
        let id = match self.last_id {
            Some(last) if last >= now => last.saturating_add(1),
            _ => now,
        };
        self.last_id = Some(id);
        id
    }
}

/// Decodes the persisted list, skipping records that are not well-formed.
fn decode_tasks(raw: &str) -> Vec<Task> {
    let records = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(records)) => records,
        Ok(_) => {
            tracing::warn!("persisted tasks are not a list; starting empty");
            return Vec::new();
        }
        Err(err) => {
            tracing::warn!(error = %err, "persisted tasks are not valid JSON; starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(records.len());
    for (idx, record) in records.into_iter().enumerate() {
        let task = match serde_json::from_value::<Task>(record) {
            Ok(task) => task,
            Err(err) => {
                tracing::warn!(index = idx, error = %err, "skipping malformed task record");
                continue;
            }
        };
        if task.text.trim().is_empty() {
            tracing::warn!(index = idx, id = task.id, "skipping task record with empty text");
            continue;
        }
        if !seen.insert(task.id) {
            tracing::warn!(index = idx, id = task.id, "skipping duplicate task id");
            continue;
        }
        tasks.push(task);
    }
    tasks
}
