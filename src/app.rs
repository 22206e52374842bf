use anyhow::Result;

use crate::domain::clock::{Clock, SystemClock};
use crate::domain::task::{Task, TaskId};
use crate::repo::KeyValueStore;
use crate::store::TaskStore;
use crate::theme::Theme;
use crate::view::{Dashboard, MonthCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Every state transition the UI can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Toggle(TaskId),
    Delete(TaskId),
    PrevMonth,
    NextMonth,
    ToggleDarkMode,
    CycleColor,
}

pub struct App<R: KeyValueStore, C: Clock = SystemClock> {
    store: TaskStore<R, C>,
    pub theme: Theme,
    pub cursor: MonthCursor,
    pub dashboard: Dashboard,
    pub selected: usize,
    pub mode: InputMode,
    pub input: String,
    pub status: Option<String>,
}

impl<R: KeyValueStore, C: Clock> App<R, C> {
    pub fn new(store: TaskStore<R, C>, theme: Theme) -> Self {
        let today = store.today();
        let cursor = MonthCursor::containing(today);
        let dashboard = Dashboard::compute(store.tasks(), cursor, today);
        Self {
            store,
            theme,
            cursor,
            dashboard,
            selected: 0,
            mode: InputMode::Normal,
            input: String::new(),
            status: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    /// Applies `command` and recomputes every derived view. Returns whether
    /// anything changed; invalid input and unknown ids are no-ops.
    pub fn dispatch(&mut self, command: Command) -> bool {
        tracing::debug!(?command, "dispatch");
        let changed = match self.apply(command) {
            Ok(changed) => changed,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "command failed");
                self.set_status(&format!("Save failed: {err:#}"));
                // The in-memory state may already have moved on.
                true
            }
        };
        self.refresh();
        changed
    }

    fn apply(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Add(text) => match self.store.add(&text)? {
                Some(_) => {
                    self.selected = 0;
                    self.set_status("Added");
                    Ok(true)
                }
                None => {
                    self.set_status("Cannot add an empty task");
                    Ok(false)
                }
            },
            Command::Toggle(id) => match self.store.toggle(id)? {
                Some(task) => {
                    self.set_status(if task.completed {
                        "Marked done"
                    } else {
                        "Marked pending"
                    });
                    Ok(true)
                }
                None => Ok(false),
            },
            Command::Delete(id) => match self.store.remove(id)? {
                Some(_) => {
                    self.set_status("Deleted");
                    Ok(true)
                }
                None => Ok(false),
            },
            Command::PrevMonth => {
                self.cursor.prev();
                Ok(true)
            }
            Command::NextMonth => {
                self.cursor.next();
                Ok(true)
            }
            Command::ToggleDarkMode => {
                self.theme.toggle_dark_mode();
                self.theme.save(self.store.repo_mut())?;
                Ok(true)
            }
            Command::CycleColor => {
                self.theme.cycle_color();
                self.theme.save(self.store.repo_mut())?;
                self.set_status(&format!("Theme color {}", self.theme.color()));
                Ok(true)
            }
        }
    }

    /// Rebuilds the dashboard from the store and clamps the selection.
    pub fn refresh(&mut self) {
        let today = self.store.today();
        self.dashboard = Dashboard::compute(self.store.tasks(), self.cursor, today);
        let len = self.store.tasks().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn select_next(&mut self) {
        let len = self.tasks().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn selected_id(&self) -> Option<TaskId> {
        self.tasks().get(self.selected).map(|t| t.id)
    }

    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            self.dispatch(Command::Toggle(id));
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            self.dispatch(Command::Delete(id));
        }
    }

    pub fn start_editing(&mut self) {
        self.mode = InputMode::Editing;
        self.input.clear();
        self.set_status("Type new task and press Enter");
    }

    pub fn cancel_editing(&mut self) {
        self.mode = InputMode::Normal;
        self.input.clear();
        self.set_status("Canceled");
    }

    /// Adds the typed task. Blank input stays in the editor untouched.
    pub fn submit_input(&mut self) {
        let text = self.input.clone();
        if self.dispatch(Command::Add(text)) {
            self.input.clear();
            self.mode = InputMode::Normal;
        }
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status = Some(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::domain::dates::date_key;
    use crate::repo::memory::InMemoryStore;
    use crate::theme::DARK_MODE_KEY;
    use crate::view::Marker;
    use time::Month;
    use time::macros::date;

    fn app_on(today: time::Date) -> App<InMemoryStore, FixedClock> {
        let store = TaskStore::load(InMemoryStore::default(), FixedClock::at(today)).unwrap();
        App::new(store, Theme::default())
    }

    #[test]
    fn adding_to_empty_store_updates_every_view() {
        let today = date!(2026 - 10 - 19);
        let mut app = app_on(today);

        assert!(app.dispatch(Command::Add("Buy milk".into())));

        assert_eq!(app.tasks().len(), 1);
        assert_eq!(date_key(app.tasks()[0].date), "2026-10-19");
        assert_eq!(app.dashboard.ratio.pending, 1);
        assert_eq!(app.dashboard.ratio.completed, 0);
        assert_eq!(
            app.dashboard.calendar.day(19).unwrap().markers,
            [Marker::Pending]
        );
    }

    #[test]
    fn toggling_refreshes_series_and_ratio() {
        let today = date!(2026 - 10 - 19);
        let mut app = app_on(today);
        app.dispatch(Command::Add("a".into()));
        app.dispatch(Command::Add("b".into()));
        let id = app.tasks()[0].id;

        app.dispatch(Command::Toggle(id));

        assert_eq!(app.dashboard.series.days[6].completed, 1);
        assert_eq!(app.dashboard.series.total(), 1);
        let ratio = app.dashboard.ratio;
        assert_eq!(ratio.completed + ratio.pending, app.tasks().len());
        assert_eq!(ratio.completed, 1);
    }

    #[test]
    fn unknown_ids_change_nothing() {
        let mut app = app_on(date!(2026 - 10 - 19));
        app.dispatch(Command::Add("a".into()));
        let before = app.tasks().to_vec();

        assert!(!app.dispatch(Command::Toggle(-1)));
        assert!(!app.dispatch(Command::Delete(-1)));
        assert_eq!(app.tasks(), before.as_slice());
    }

    #[test]
    fn blank_input_keeps_editor_open() {
        let mut app = app_on(date!(2026 - 10 - 19));
        app.start_editing();
        app.input.push_str("   ");
        app.submit_input();

        assert_eq!(app.mode, InputMode::Editing);
        assert_eq!(app.input, "   ");
        assert!(app.tasks().is_empty());

        app.input = "Write report".into();
        app.submit_input();
        assert_eq!(app.mode, InputMode::Normal);
        assert!(app.input.is_empty());
        assert_eq!(app.tasks()[0].text, "Write report");
    }

    #[test]
    fn navigating_past_december_rolls_the_year() {
        let mut app = app_on(date!(2026 - 12 - 15));
        app.dispatch(Command::NextMonth);
        assert_eq!(app.cursor.year, 2027);
        assert_eq!(app.cursor.month, Month::January);
        assert_eq!(app.dashboard.calendar.title(), "January 2027");

        app.dispatch(Command::PrevMonth);
        assert_eq!(app.cursor, MonthCursor::containing(date!(2026 - 12 - 15)));
    }

    #[test]
    fn deleting_last_row_clamps_selection() {
        let mut app = app_on(date!(2026 - 10 - 19));
        app.dispatch(Command::Add("a".into()));
        app.dispatch(Command::Add("b".into()));
        app.select_next();
        assert_eq!(app.selected, 1);

        app.delete_selected();
        assert_eq!(app.selected, 0);
        assert_eq!(app.tasks().len(), 1);
        assert_eq!(app.tasks()[0].text, "b");
    }

    #[test]
    fn theme_commands_persist_settings() {
        let mut app = app_on(date!(2026 - 10 - 19));
        app.dispatch(Command::ToggleDarkMode);
        assert!(app.theme.dark_mode);
        assert_eq!(
            app.store.repo().get(DARK_MODE_KEY).unwrap().as_deref(),
            Some("true")
        );

        app.dispatch(Command::CycleColor);
        assert_ne!(app.theme.color(), crate::theme::DEFAULT_COLOR);
    }
}
