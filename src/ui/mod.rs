use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, List, ListItem, ListState,
        Paragraph, Wrap,
    },
};

use crate::app::{App, Command, InputMode};
use crate::domain::clock::Clock;
use crate::domain::dates::date_key;
use crate::domain::task::Task;
use crate::repo::KeyValueStore;
use crate::theme::Theme;
use crate::view::{CalendarMonth, CompletionRatio, CompletionSeries, MAX_DAY_MARKERS, Marker};

const WEEKDAY_HEADERS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
const DAY_NUMBER_WIDTH: usize = 3;
const CELL_WIDTH: usize = DAY_NUMBER_WIDTH + MAX_DAY_MARKERS + 1;

pub fn run<R: KeyValueStore, C: Clock>(mut app: App<R, C>, tick_rate: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut last_tick = Instant::now();
    let res = loop {
        if let Err(err) = terminal.draw(|f| draw(f, &app)) {
            break Err(err.into());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        match poll_key(timeout) {
            Ok(Some(code)) if handle_key(&mut app, code) => break Ok(()),
            Ok(_) => {}
            Err(err) => break Err(err),
        }

        if last_tick.elapsed() >= tick_rate {
            // Keeps "today" current across midnight.
            app.refresh();
            last_tick = Instant::now();
        }
    };

    cleanup_terminal(&mut terminal)?;
    res
}

fn poll_key(timeout: Duration) -> Result<Option<KeyCode>> {
    if event::poll(timeout)?
        && let Event::Key(key) = event::read()?
        && key.kind == KeyEventKind::Press
    {
        return Ok(Some(key.code));
    }
    Ok(None)
}

/// Routes a key press to the app. Returns `true` when the user quits.
fn handle_key<R: KeyValueStore, C: Clock>(app: &mut App<R, C>, code: KeyCode) -> bool {
    match app.mode {
        InputMode::Normal => match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => app.select_next(),
            KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
            KeyCode::Char('a') | KeyCode::Char('n') => app.start_editing(),
            KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
            KeyCode::Char('h') | KeyCode::Left => {
                app.dispatch(Command::PrevMonth);
            }
            KeyCode::Char('l') | KeyCode::Right => {
                app.dispatch(Command::NextMonth);
            }
            KeyCode::Char('t') => {
                app.dispatch(Command::ToggleDarkMode);
            }
            KeyCode::Char('p') => {
                app.dispatch(Command::CycleColor);
            }
            _ => {}
        },
        InputMode::Editing => match code {
            KeyCode::Esc => app.cancel_editing(),
            KeyCode::Enter => app.submit_input(),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Char(c) => app.input.push(c),
            _ => {}
        },
    }

    false
}

fn draw<R: KeyValueStore, C: Clock>(f: &mut ratatui::Frame, app: &App<R, C>) {
    let size = f.area();
    let theme = &app.theme;

    f.render_widget(
        Block::default().style(Style::default().bg(theme.background()).fg(theme.text())),
        size,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(size);

    f.render_widget(render_header(app), chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    let mut list_state = ListState::default();
    if !app.tasks().is_empty() {
        list_state.select(Some(app.selected));
    }
    let list = render_list(app.tasks(), app.selected, theme);
    f.render_stateful_widget(list, body[0], &mut list_state);

    draw_dashboard(f, app, body[1]);

    f.render_widget(render_footer(app), chunks[2]);
}

fn draw_dashboard<R: KeyValueStore, C: Clock>(f: &mut ratatui::Frame, app: &App<R, C>, area: Rect) {
    let weeks = app.dashboard.calendar.weeks().len() as u16;
    let panes = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(weeks + 3),
        ])
        .split(area);

    let points: Vec<(f64, f64)> = app
        .dashboard
        .series
        .days
        .iter()
        .enumerate()
        .map(|(idx, day)| (idx as f64, day.completed as f64))
        .collect();
    f.render_widget(
        render_chart(&app.dashboard.series, &points, &app.theme),
        panes[0],
    );
    f.render_widget(render_ratio(app.dashboard.ratio, &app.theme), panes[1]);
    f.render_widget(
        render_calendar(&app.dashboard.calendar, &app.theme),
        panes[2],
    );
}

fn render_header<R: KeyValueStore, C: Clock>(app: &App<R, C>) -> Paragraph<'static> {
    let ratio = app.dashboard.ratio;
    let summary = format!("Open: {} / All: {}", ratio.pending, ratio.total());
    let today = app
        .dashboard
        .series
        .days
        .last()
        .map(|d| date_key(d.day.date))
        .unwrap_or_default();
    let line = Line::from(vec![
        Span::styled("tally", Style::default().fg(app.theme.accent())),
        Span::raw("  |  "),
        Span::styled(summary, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  |  "),
        Span::styled(today, Style::default().fg(app.theme.muted())),
    ]);
    Paragraph::new(line)
        .block(Block::default().title("Overview").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn render_list<'a>(tasks: &'a [Task], selected: usize, theme: &Theme) -> List<'a> {
    let items: Vec<ListItem> = tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| {
            let symbol = if task.completed { "✔" } else { "•" };
            let line = vec![
                Span::raw(format!(" {symbol} {}", task.text)),
                Span::styled(
                    format!("  {}", date_key(task.date)),
                    Style::default().fg(theme.muted()),
                ),
            ];

            let style = if idx == selected {
                Style::default()
                    .fg(theme.accent())
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else if task.completed {
                Style::default()
                    .fg(theme.muted())
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(line)).style(style)
        })
        .collect();

    List::new(items)
        .block(
            Block::default()
                .title("Tasks (j/k move ; a add ; Space toggle ; d delete)")
                .borders(Borders::ALL),
        )
        .highlight_symbol("➤ ")
}

fn render_chart<'a>(
    series: &CompletionSeries,
    points: &'a [(f64, f64)],
    theme: &Theme,
) -> Chart<'a> {
    let accent = Style::default().fg(theme.accent());
    let muted = Style::default().fg(theme.muted());
    let peak = series.peak().max(1);

    let dataset = Dataset::default()
        .name("Completed")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(accent)
        .data(points);

    let x_labels: Vec<Span> = series
        .days
        .iter()
        .map(|d| Span::styled(d.day.label, muted))
        .collect();
    let y_labels = vec![
        Span::styled("0", muted),
        Span::styled(peak.to_string(), muted),
    ];

    Chart::new(vec![dataset])
        .block(
            Block::default()
                .title(format!("Completed, last 7 days ({})", series.total()))
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .style(muted)
                .bounds([0.0, (series.days.len() - 1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(muted)
                .bounds([0.0, peak as f64])
                .labels(y_labels),
        )
}

fn render_ratio(ratio: CompletionRatio, theme: &Theme) -> Gauge<'static> {
    Gauge::default()
        .block(Block::default().title("Done / Pending").borders(Borders::ALL))
        .gauge_style(Style::default().fg(theme.accent()).bg(theme.track()))
        .ratio(ratio.done_fraction())
        .label(format!("Done {} / Pending {}", ratio.completed, ratio.pending))
}

fn render_calendar(calendar: &CalendarMonth, theme: &Theme) -> Paragraph<'static> {
    let muted = Style::default().fg(theme.muted());
    let header: Vec<Span> = WEEKDAY_HEADERS
        .iter()
        .map(|d| {
            let cell = format!("{d:>w$}{:m$} ", "", w = DAY_NUMBER_WIDTH, m = MAX_DAY_MARKERS);
            Span::styled(cell, muted)
        })
        .collect();

    let mut lines = vec![Line::from(header)];
    for week in calendar.weeks() {
        let mut spans = Vec::new();
        for cell in week {
            let Some(day) = cell else {
                spans.push(Span::raw(" ".repeat(CELL_WIDTH)));
                continue;
            };
            let day_style = if day.is_today {
                Style::default()
                    .fg(theme.accent())
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default()
            };
            spans.push(Span::styled(
                format!("{:>w$}", day.date.day(), w = DAY_NUMBER_WIDTH),
                day_style,
            ));
            for marker in &day.markers {
                spans.push(match marker {
                    Marker::Completed => Span::styled("●", Style::default().fg(theme.accent())),
                    Marker::Pending => Span::styled("○", muted),
                });
            }
            spans.push(Span::raw(" ".repeat(CELL_WIDTH - DAY_NUMBER_WIDTH - day.markers.len())));
        }
        lines.push(Line::from(spans));
    }

    Paragraph::new(lines).block(
        Block::default()
            .title(format!("{} (h/l month)", calendar.title()))
            .borders(Borders::ALL),
    )
}

fn render_footer<R: KeyValueStore, C: Clock>(app: &App<R, C>) -> Paragraph<'_> {
    match app.mode {
        InputMode::Normal => {
            let msg = app
                .status
                .as_deref()
                .unwrap_or("q quit ; a add ; h/l month ; t dark mode ; p theme color");
            Paragraph::new(msg).block(Block::default().title("Normal").borders(Borders::ALL))
        }
        InputMode::Editing => {
            let line = Line::from(vec![
                Span::raw("New task: "),
                Span::styled(&app.input, Style::default().fg(app.theme.accent())),
                Span::raw("█"),
            ]);
            Paragraph::new(line).block(
                Block::default()
                    .title("Input (Enter to add / Esc to cancel)")
                    .borders(Borders::ALL),
            )
        }
    }
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
