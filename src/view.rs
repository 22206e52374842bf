//! Derived views: the 7-day completion series, the done/pending ratio and the
//! annotated month calendar. Everything here is recomputed from scratch out
//! of the task list; nothing is persisted.

use std::collections::HashMap;

use time::{Date, Month};

use crate::domain::dates::{self, DayLabel, WINDOW_DAYS};
use crate::domain::task::Task;

/// Dots drawn per calendar day; further tasks on that day are not shown.
pub const MAX_DAY_MARKERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount {
    pub day: DayLabel,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSeries {
    pub days: [DayCount; WINDOW_DAYS],
}

impl CompletionSeries {
    pub fn total(&self) -> usize {
        self.days.iter().map(|d| d.completed).sum()
    }

    pub fn peak(&self) -> usize {
        self.days.iter().map(|d| d.completed).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionRatio {
    pub completed: usize,
    pub pending: usize,
}

impl CompletionRatio {
    pub fn total(&self) -> usize {
        self.completed + self.pending
    }

    /// Share of completed tasks in `0.0..=1.0`; zero for an empty store.
    pub fn done_fraction(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.completed as f64 / total as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Completed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: Date,
    /// At most `MAX_DAY_MARKERS`, in store order (newest first).
    pub markers: Vec<Marker>,
    pub task_count: usize,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMonth {
    pub cursor: MonthCursor,
    pub leading_blanks: u8,
    pub days: Vec<CalendarDay>,
}

impl CalendarMonth {
    pub fn title(&self) -> String {
        format!("{} {}", dates::month_name(self.cursor.month), self.cursor.year)
    }

    #[cfg(test)]
    pub fn day(&self, day: u8) -> Option<&CalendarDay> {
        self.days.get(usize::from(day).checked_sub(1)?)
    }

    /// Sunday-first rows of seven cells; blanks pad the first and last week.
    pub fn weeks(&self) -> Vec<[Option<&CalendarDay>; 7]> {
        let cells: Vec<Option<&CalendarDay>> = std::iter::repeat_n(None, self.leading_blanks.into())
            .chain(self.days.iter().map(Some))
            .collect();
        cells
            .chunks(7)
            .map(|chunk| std::array::from_fn(|idx| chunk.get(idx).copied().flatten()))
            .collect()
    }
}

/// Month shown by the calendar. Navigation is month-granular.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    pub month: Month,
}

impl MonthCursor {
    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn prev(&mut self) {
        self.shift(-1);
    }

    pub fn next(&mut self) {
        self.shift(1);
    }

    fn shift(&mut self, delta: i32) {
        if let Some((year, month)) = dates::shift_month(self.year, self.month, delta) {
            self.year = year;
            self.month = month;
        }
    }
}

pub fn completion_series(tasks: &[Task], today: Date) -> CompletionSeries {
    let days = dates::last_7_days(today).map(|day| DayCount {
        day,
        completed: tasks
            .iter()
            .filter(|t| t.completed && t.date == day.date)
            .count(),
    });
    CompletionSeries { days }
}

pub fn completion_ratio(tasks: &[Task]) -> CompletionRatio {
    let completed = tasks.iter().filter(|t| t.completed).count();
    CompletionRatio {
        completed,
        pending: tasks.len() - completed,
    }
}

pub fn calendar_month(tasks: &[Task], cursor: MonthCursor, today: Date) -> CalendarMonth {
    let Some(grid) = dates::month_grid(cursor.year, cursor.month) else {
        return CalendarMonth {
            cursor,
            leading_blanks: 0,
            days: Vec::new(),
        };
    };

    let mut by_day: HashMap<u8, Vec<&Task>> = HashMap::new();
    for task in tasks
        .iter()
        .filter(|t| t.date.year() == cursor.year && t.date.month() == cursor.month)
    {
        by_day.entry(task.date.day()).or_default().push(task);
    }

    let days = (1..=grid.days_in_month)
        .filter_map(|day| Date::from_calendar_date(cursor.year, cursor.month, day).ok())
        .map(|date| {
            let on_day = by_day.get(&date.day()).map(Vec::as_slice).unwrap_or_default();
            CalendarDay {
                date,
                markers: on_day
                    .iter()
                    .take(MAX_DAY_MARKERS)
                    .map(|t| {
                        if t.completed {
                            Marker::Completed
                        } else {
                            Marker::Pending
                        }
                    })
                    .collect(),
                task_count: on_day.len(),
                is_today: date == today,
            }
        })
        .collect();

    CalendarMonth {
        cursor,
        leading_blanks: grid.leading_blanks,
        days,
    }
}

/// All derived views for one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub series: CompletionSeries,
    pub ratio: CompletionRatio,
    pub calendar: CalendarMonth,
}

impl Dashboard {
    pub fn compute(tasks: &[Task], cursor: MonthCursor, today: Date) -> Self {
        Self {
            series: completion_series(tasks, today),
            ratio: completion_ratio(tasks),
            calendar: calendar_month(tasks, cursor, today),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    const TODAY: Date = date!(2026 - 10 - 19);

    fn task(id: i64, date: Date, completed: bool) -> Task {
        let task = Task::new(id, format!("task {id}"), date);
        if completed { task.into_completed() } else { task }
    }

    #[test]
    fn empty_store_yields_zeroed_views() {
        let cursor = MonthCursor::containing(TODAY);
        let dash = Dashboard::compute(&[], cursor, TODAY);

        assert_eq!(dash.series.total(), 0);
        assert_eq!(dash.ratio, CompletionRatio::default());
        assert_eq!(dash.ratio.done_fraction(), 0.0);
        assert_eq!(dash.calendar.days.len(), 31);
        assert!(dash.calendar.days.iter().all(|d| d.markers.is_empty()));
    }

    #[test]
    fn series_counts_only_completed_tasks_inside_window() {
        let tasks = vec![
            task(1, TODAY, true),
            task(2, TODAY, true),
            task(3, TODAY, false),
            task(4, date!(2026 - 10 - 13), true),
            task(5, date!(2026 - 10 - 12), true),
            task(6, date!(2026 - 10 - 20), true),
        ];
        let series = completion_series(&tasks, TODAY);

        let counts: Vec<_> = series.days.iter().map(|d| d.completed).collect();
        assert_eq!(counts, [1, 0, 0, 0, 0, 0, 2]);
        assert_eq!(series.total(), 3);
        assert_eq!(series.peak(), 2);
        assert_eq!(series.days[6].day.label, "Mon");
    }

    #[test]
    fn ratio_is_all_time() {
        let tasks = vec![
            task(1, date!(2020 - 01 - 01), true),
            task(2, TODAY, false),
            task(3, TODAY, false),
        ];
        let ratio = completion_ratio(&tasks);
        assert_eq!(ratio, CompletionRatio { completed: 1, pending: 2 });
        assert_eq!(ratio.total(), tasks.len());
    }

    #[test]
    fn calendar_caps_markers_in_store_order() {
        let day = date!(2026 - 10 - 05);
        let tasks = vec![
            task(5, day, true),
            task(4, day, false),
            task(3, day, true),
            task(2, day, false),
            task(1, date!(2026 - 09 - 05), false),
        ];
        let cal = calendar_month(&tasks, MonthCursor::containing(day), TODAY);

        let cell = cal.day(5).unwrap();
        assert_eq!(
            cell.markers,
            [Marker::Completed, Marker::Pending, Marker::Completed]
        );
        assert_eq!(cell.task_count, 4);
        assert!(cal.day(6).unwrap().markers.is_empty());
        assert_eq!(cal.leading_blanks, 4);
        assert!(cal.day(19).unwrap().is_today);
        assert!(!cell.is_today);
    }

    #[test]
    fn same_day_tasks_with_one_completed_show_two_dots() {
        let tasks = vec![task(2, TODAY, true), task(1, TODAY, false)];
        let dash = Dashboard::compute(&tasks, MonthCursor::containing(TODAY), TODAY);

        let cell = dash.calendar.day(19).unwrap();
        assert_eq!(cell.markers, [Marker::Completed, Marker::Pending]);
        assert_eq!(dash.ratio, CompletionRatio { completed: 1, pending: 1 });
    }

    #[test]
    fn weeks_pad_to_sunday_first_rows() {
        let cal = calendar_month(&[], MonthCursor::containing(TODAY), TODAY);
        let weeks = cal.weeks();

        // October 2026: 4 blanks + 31 days = 35 cells.
        assert_eq!(weeks.len(), 5);
        assert!(weeks[0][3].is_none());
        assert_eq!(weeks[0][4].map(|d| d.date.day()), Some(1));
        assert_eq!(weeks[4][6].map(|d| d.date.day()), Some(31));
    }

    #[test]
    fn cursor_navigation_is_reversible_and_rolls_years() {
        let mut cursor = MonthCursor {
            year: 2026,
            month: Month::December,
        };
        cursor.next();
        assert_eq!(cursor, MonthCursor { year: 2027, month: Month::January });
        cursor.prev();
        assert_eq!(cursor, MonthCursor { year: 2026, month: Month::December });

        for month in [Month::January, Month::June, Month::December] {
            let start = MonthCursor { year: 2026, month };
            let mut moved = start;
            moved.prev();
            moved.next();
            assert_eq!(moved, start);
        }
    }

    #[test]
    fn calendar_title_names_month_and_year() {
        let cal = calendar_month(&[], MonthCursor::containing(date!(2024 - 02 - 10)), TODAY);
        assert_eq!(cal.title(), "February 2024");
        assert_eq!(cal.days.len(), 29);
    }
}
