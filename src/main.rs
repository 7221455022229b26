use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table,
};
use rusqlite::Connection;
use tracing::{info, warn};

use understat_terminal::compare::comparison_max;
use understat_terminal::config::AppConfig;
use understat_terminal::dashboard::{overview_view, DashboardState, LaunchArgs, Mode, OverviewView, Tab, TeamPrompt, TeamSlot};
use understat_terminal::derived::{normalize_by_max, partition_differentials, stat_series, stat_totals, OVERVIEW_STATS};
use understat_terminal::fetch::{HttpPageSource, PageSource};
use understat_terminal::league::LeagueDirectory;
use understat_terminal::normalize::StatTable;
use understat_terminal::session::{StatsSession, TeamOverview};
use understat_terminal::{logging, persist};

struct App<S: PageSource> {
    state: DashboardState,
    session: StatsSession<S>,
    conn: Option<Connection>,
    should_quit: bool,
}

impl<S: PageSource> App<S> {
    fn reload(&mut self) {
        self.state.push_log("[INFO] Loading...");
        self.state.refresh(&mut self.session, self.conn.as_mut());
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.prompt.is_some() {
            self.on_prompt_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Tab => self.state.toggle_tab(),
            KeyCode::Char('c') => {
                self.state.next_category();
                self.reload();
            }
            KeyCode::Char('C') => {
                self.state.prev_category();
                self.reload();
            }
            KeyCode::Char('m') | KeyCode::Right => self.state.next_metric(),
            KeyCode::Char('M') | KeyCode::Left => self.state.prev_metric(),
            KeyCode::Char(']') => {
                self.state.shift_left_year(true);
                self.reload();
            }
            KeyCode::Char('[') => {
                self.state.shift_left_year(false);
                self.reload();
            }
            KeyCode::Char('}') => {
                self.state.shift_right_year(true);
                self.reload();
            }
            KeyCode::Char('{') => {
                self.state.shift_right_year(false);
                self.reload();
            }
            KeyCode::Char(ch @ '1'..='6') => {
                let idx = ch as usize - '1' as usize;
                self.state.toggle_stat(OVERVIEW_STATS[idx]);
            }
            KeyCode::Char('t') => self.state.begin_team_prompt(TeamSlot::Left),
            KeyCode::Char('T') => self.state.begin_team_prompt(TeamSlot::Right),
            KeyCode::Char('g') => {
                self.state.cycle_mode();
                self.reload();
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    fn on_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if self.state.commit_prompt() {
                    self.reload();
                }
            }
            KeyCode::Esc => self.state.cancel_prompt(),
            KeyCode::Backspace => self.state.prompt_backspace(),
            KeyCode::Char(ch) => self.state.prompt_push(ch),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    if let Some(path) = config.log_file.as_deref() {
        if let Err(err) = logging::init_file(path) {
            eprintln!("warning: file logging disabled: {err:#}");
        }
    }

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let launch = LaunchArgs::parse(&args);

    let leagues = match config.leagues_file.as_deref() {
        Some(path) => LeagueDirectory::with_overrides(path)?,
        None => LeagueDirectory::builtin(),
    };
    let source = HttpPageSource::new(&config).context("unable to build page source")?;
    let session = StatsSession::new(source, config.base_url.clone(), leagues);
    let conn = open_store(&config, &launch);

    let mut app = App {
        state: DashboardState::new(&launch),
        session,
        conn,
        should_quit: false,
    };
    info!(mode = app.state.mode.label(), "starting dashboard");
    app.reload();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn open_store(config: &AppConfig, launch: &LaunchArgs) -> Option<Connection> {
    if launch.no_db {
        return None;
    }
    let path = launch
        .db_path
        .as_deref()
        .map(std::path::PathBuf::from)
        .or_else(|| config.db_path.clone())?;
    match persist::open_db(&path) {
        Ok(conn) => Some(conn),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "persistence disabled");
            None
        }
    }
}

fn run_app<B: Backend, S: PageSource>(terminal: &mut Terminal<B>, app: &mut App<S>) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui(f, &app.state))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match state.mode {
        Mode::CompareTeams | Mode::CompareYears => match state.tab {
            Tab::Tables => render_tables(frame, chunks[1], state),
            Tab::Plot => render_comparison(frame, chunks[1], state),
        },
        Mode::SingleTeam => render_overview(frame, chunks[1], state),
    }

    render_logs(frame, chunks[2], state);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
    if let Some(prompt) = &state.prompt {
        render_team_prompt(frame, frame.size(), prompt);
    }
}

fn render_team_prompt(frame: &mut Frame, area: Rect, prompt: &TeamPrompt) {
    let rect = centered_rect(50, 20, area);
    frame.render_widget(Clear, rect);
    let title = match prompt.slot {
        TeamSlot::Left => "Team 1",
        TeamSlot::Right => "Team 2",
    };
    let text = vec![
        Line::from(format!("{}_", prompt.buffer)),
        Line::from(Span::styled(
            "Enter apply | Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let widget = Paragraph::new(text).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(widget, rect);
}

fn header_text(state: &DashboardState) -> String {
    let subject = match state.mode {
        Mode::CompareTeams => format!(
            "{} {} vs {} {}",
            state.left.team, state.left.year, state.right.team, state.right.year
        ),
        Mode::CompareYears => format!("{} {} vs {}", state.left.team, state.left.year, state.right.year),
        Mode::SingleTeam => format!("{} {} | {}", state.left.team, state.left.year, state.stats.join(", ")),
    };
    let metric = state.selected_metric().unwrap_or_else(|| "-".to_string());
    format!(
        "UNDERSTAT TERMINAL | {}\n{} | {} | Metric: {}",
        state.mode.label(),
        subject,
        state.category,
        metric
    )
}

fn footer_text(state: &DashboardState) -> String {
    match state.mode {
        Mode::CompareTeams | Mode::CompareYears => {
            "Tab Tables/Plot | c/C Category | m/M Metric | t/T Team | [/] Year 1 | {/} Year 2 | g Mode | ? Help | q Quit"
                .to_string()
        }
        Mode::SingleTeam => "1-6 Toggle stat | t Team | [/] Year | g Mode | r Reload | ? Help | q Quit".to_string(),
    }
}

fn render_tables(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let sides = [
        (&state.left_table, &state.left.team, state.left.year, cols[0]),
        (&state.right_table, &state.right.team, state.right.year, cols[1]),
    ];
    for (table, team, year, rect) in sides {
        let title = format!("{team} {year} - {} Data", state.category);
        match table {
            Some(table) => frame.render_widget(stat_table_widget(&table.sorted_by_bucket_desc(), title), rect),
            None => {
                let empty = Paragraph::new("No data")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(Block::default().title(title).borders(Borders::ALL));
                frame.render_widget(empty, rect);
            }
        }
    }
}

fn stat_table_widget(table: &StatTable, title: String) -> Table<'static> {
    let mut header = vec![Cell::from(table.category.label().to_string())];
    header.extend(table.columns.iter().map(|c| Cell::from(c.clone())));

    let rows = table.rows.iter().map(|r| {
        let mut cells = vec![Cell::from(r.bucket.clone())];
        cells.extend(r.values.iter().map(|v| Cell::from(fmt_cell(*v))));
        Row::new(cells)
    });

    let mut widths = vec![Constraint::Length(14)];
    widths.extend(table.columns.iter().map(|_| Constraint::Length(8)));

    Table::new(rows.collect::<Vec<_>>(), widths)
        .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().title(title).borders(Borders::ALL))
}

fn fmt_cell(v: Option<f64>) -> String {
    match v {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

fn render_comparison(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let Some(metric) = state.selected_metric() else {
        let empty = Paragraph::new("Please enter valid teams and years to compare data.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };
    let rows = state.comparison();
    let max = comparison_max(&rows);

    let left_style = Style::default().fg(Color::Cyan);
    let right_style = Style::default().fg(Color::Magenta);
    let groups: Vec<BarGroup> = rows
        .iter()
        .map(|r| {
            let bars = [
                comparison_bar(r.left, left_style),
                comparison_bar(r.right, right_style),
            ];
            BarGroup::default().label(Line::from(r.bucket.clone())).bars(&bars)
        })
        .collect();

    let title = format!(
        "{} - {} Comparison | {} ({}) cyan vs {} ({}) magenta",
        state.category, metric, state.left.team, state.left.year, state.right.team, state.right.year
    );
    let mut chart = BarChart::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .bar_width(6)
        .bar_gap(1)
        .group_gap(3)
        .max(scaled(max).max(1));
    for group in groups {
        chart = chart.data(group);
    }
    frame.render_widget(chart, area);
}

fn comparison_bar(value: Option<f64>, style: Style) -> Bar<'static> {
    Bar::default()
        .value(value.map(scaled).unwrap_or(0))
        .text_value(value.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".to_string()))
        .style(style)
}

fn scaled(v: f64) -> u64 {
    (v.max(0.0) * 100.0).round() as u64
}

fn render_overview(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let Some(overview) = &state.overview else {
        let empty = Paragraph::new("No overview data for this team and season")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };
    match overview_view(&state.stats) {
        OverviewView::Differential => render_differential(frame, area, overview),
        OverviewView::Series => render_series(frame, area, overview, &state.stats),
        OverviewView::Totals => render_totals(frame, area, overview, &state.stats),
    }
}

fn render_differential(frame: &mut Frame, area: Rect, overview: &TeamOverview) {
    const HALF_WIDTH: f64 = 12.0;
    let (positive, negative) = partition_differentials(&overview.differentials);

    let mut lines = Vec::with_capacity(overview.differentials.len());
    for d in &overview.differentials {
        let opponent = overview.opponent(d.match_index).unwrap_or("?");
        let len = ((d.diff.abs() / 3.0) * HALF_WIDTH).round().min(HALF_WIDTH) as usize;
        let (bar, color) = if d.diff > 0.0 {
            (format!("{}|{}", " ".repeat(12), "█".repeat(len)), Color::Cyan)
        } else if d.diff < 0.0 {
            (format!("{}{}|", " ".repeat(12 - len), "█".repeat(len)), Color::Red)
        } else {
            (format!("{}|", " ".repeat(12)), Color::Gray)
        };
        lines.push(Line::from(vec![
            Span::raw(format!("{:>2} {:<22}", d.match_index, opponent)),
            Span::styled(bar, Style::default().fg(color)),
            Span::raw(format!(" {:+.2}", d.diff)),
        ]));
    }

    let title = format!(
        "{} {} Season xG Differential | positive {} / negative {}",
        overview.team,
        overview.year,
        positive.len(),
        negative.len()
    );
    let widget = Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn render_series(frame: &mut Frame, area: Rect, overview: &TeamOverview, stats: &[String]) {
    let colors = [Color::Cyan, Color::Yellow];
    let series: Vec<(String, Vec<(f64, f64)>)> = stats
        .iter()
        .map(|stat| {
            let points = stat_series(&overview.history, stat)
                .into_iter()
                .map(|(idx, v)| (idx as f64, v))
                .collect();
            (stat.clone(), points)
        })
        .collect();

    let n = overview.history.len().max(1) as f64;
    let y_max = series
        .iter()
        .flat_map(|(_, pts)| pts.iter().map(|(_, y)| *y))
        .fold(0.0, f64::max)
        .max(1.0);
    let y_min = series
        .iter()
        .flat_map(|(_, pts)| pts.iter().map(|(_, y)| *y))
        .fold(0.0, f64::min);

    let datasets = series
        .iter()
        .enumerate()
        .map(|(i, (name, pts))| {
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(colors[i % colors.len()]))
                .data(pts)
        })
        .collect::<Vec<_>>();

    let title = format!("{} {} - {} Over Matches", overview.team, overview.year, stats.join(" & "));
    let chart = Chart::new(datasets)
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title("Matchday")
                .bounds([1.0, n])
                .labels(vec![Span::raw("1"), Span::raw(format!("{n:.0}"))]),
        )
        .y_axis(
            Axis::default()
                .title("Value")
                .bounds([y_min, y_max])
                .labels(vec![Span::raw(format!("{y_min:.1}")), Span::raw(format!("{y_max:.1}"))]),
        );
    frame.render_widget(chart, area);
}

fn render_totals(frame: &mut Frame, area: Rect, overview: &TeamOverview, stats: &[String]) {
    let wanted: Vec<&str> = stats.iter().map(String::as_str).collect();
    let totals = stat_totals(&overview.history, &wanted);
    if totals.is_empty() {
        let empty = Paragraph::new("None of the selected stats are available in the data.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }
    let values: Vec<f64> = totals.iter().map(|(_, v)| *v).collect();
    let normalized = normalize_by_max(&values);

    let bars: Vec<Bar> = totals
        .iter()
        .zip(&normalized)
        .map(|((stat, total), norm)| {
            Bar::default()
                .label(Line::from(stat.clone()))
                .value(scaled(*norm))
                .text_value(format!("{total:.1}"))
                .style(Style::default().fg(Color::Blue))
        })
        .collect();

    let title = format!("{} ({}) - Normalized Stats", overview.team, overview.year);
    let chart = BarChart::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .bar_width(8)
        .bar_gap(2)
        .max(100);
    frame.render_widget(chart, area);
}

fn render_logs(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = state.logs.len().saturating_sub(visible);
    let text = state.logs.iter().skip(skip).cloned().collect::<Vec<_>>().join("\n");
    let logs = Paragraph::new(text).block(Block::default().title("Log").borders(Borders::ALL));
    frame.render_widget(logs, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Understat Terminal - Help",
        "",
        "Comparison modes:",
        "  Tab          Tables / Plot",
        "  c / C        Next / previous category",
        "  m / M        Next / previous metric",
        "  [ / ]        Year of team 1",
        "  { / }        Year of team 2",
        "  t / T        Type team 1 / team 2",
        "",
        "Single team:",
        "  1-6          Toggle xG xGA npxG npxGA xpts npxGD",
        "  [ / ]        Season",
        "  t            Type team",
        "",
        "  g            Next mode",
        "  r            Reload",
        "  ?            Toggle help",
        "  q / Esc      Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
