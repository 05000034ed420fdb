use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};

use goalkick_terminal::config::{GeminiConfig, load_dotenv};
use goalkick_terminal::gemini::GeminiClient;
use goalkick_terminal::model::{ConfidenceTier, GenerationMode, MAX_MATCHES, Prediction};
use goalkick_terminal::parser::UuidIds;
use goalkick_terminal::provider::spawn_prediction_provider;
use goalkick_terminal::service::PredictionService;
use goalkick_terminal::state::{
    self, AppState, Delta, InputMode, LOADING_STEPS, PredictionState, ProviderCommand,
    apply_delta,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if let InputMode::AddingMatch { buffer } = &mut self.state.input {
            match key.code {
                KeyCode::Enter => {
                    let raw = std::mem::take(buffer);
                    self.state.input = InputMode::Normal;
                    self.state.add_custom_match(&raw);
                }
                KeyCode::Esc => self.state.input = InputMode::Normal,
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char('s') if self.state.status != PredictionState::Loading => {
                self.generate(GenerationMode::Standard)
            }
            KeyCode::Char('z') if self.state.status != PredictionState::Loading => {
                self.generate(GenerationMode::Sniper)
            }
            KeyCode::Char('r') => {
                if let Some(cmd) = self.state.retry_command() {
                    self.send(cmd);
                }
            }
            KeyCode::Char('b') | KeyCode::Esc => self.state.back_to_idle(),
            KeyCode::Char('a') if self.state.status == PredictionState::Idle => {
                if self.state.custom_matches.len() >= MAX_MATCHES {
                    self.state
                        .push_log(format!("[WARN] At most {MAX_MATCHES} custom matches"));
                } else {
                    self.state.input = InputMode::AddingMatch {
                        buffer: String::new(),
                    };
                }
            }
            KeyCode::Char('x') if self.state.status == PredictionState::Idle => {
                self.state.clear_custom_matches()
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.state.status == PredictionState::Success {
                    self.state.toggle_expanded();
                }
            }
            _ => {}
        }
    }

    fn generate(&mut self, mode: GenerationMode) {
        if let Some(cmd) = self.state.begin_generation(mode) {
            self.send(cmd);
        }
    }

    fn send(&mut self, cmd: ProviderCommand) {
        let mode = match &cmd {
            ProviderCommand::Generate { mode, .. } => *mode,
        };
        let sent = self
            .cmd_tx
            .as_ref()
            .is_some_and(|tx| tx.send(cmd).is_ok());
        if !sent {
            apply_delta(
                &mut self.state,
                Delta::GenerationFailed {
                    mode,
                    message: mode.failure_message().to_string(),
                },
            );
            self.state
                .push_log("[WARN] Prediction engine unavailable (check GEMINI_API_KEY)");
        }
    }
}

fn main() -> io::Result<()> {
    load_dotenv();

    let cfg = GeminiConfig::from_env();
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let mut startup_logs = Vec::new();
    let cmd_tx = match GeminiClient::new(&cfg) {
        Ok(client) => {
            let service = PredictionService::new(client, UuidIds)
                .with_search_grounding(cfg.search_grounding);
            spawn_prediction_provider(service, tx, cmd_rx);
            startup_logs.push(format!("[INFO] Model: {}", cfg.model));
            Some(cmd_tx)
        }
        Err(err) => {
            startup_logs.push(format!("[WARN] Gemini client unavailable: {err:#}"));
            None
        }
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(cmd_tx);
    for msg in startup_logs {
        app.state.push_log(msg);
    }
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.status {
        PredictionState::Idle => render_idle(frame, chunks[1], &app.state),
        PredictionState::Loading => render_loading(frame, chunks[1], &app.state),
        PredictionState::Error => render_error(frame, chunks[1], &app.state),
        PredictionState::Success => render_results(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = format!(
        "GOALKICK AI | {} | {}",
        state.mode.label(),
        status_label(state.status)
    );
    let line1 = format!("  .-.  {title}");
    let line2 = " (   ) AI soccer predictions, grounded on live search".to_string();
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    if matches!(state.input, InputMode::AddingMatch { .. }) {
        return "Enter Add | Esc Cancel".to_string();
    }
    match state.status {
        PredictionState::Idle => {
            "s Standard | z 0:0 Sniper | a Add match | x Clear matches | ? Help | q Quit".to_string()
        }
        PredictionState::Loading => "Analysis running... | ? Help | q Quit".to_string(),
        PredictionState::Error => "r Retry | b/Esc Back | ? Help | q Quit".to_string(),
        PredictionState::Success => {
            "j/k/↑/↓ Move | Enter Expand | r Refresh | b/Esc Back | ? Help | q Quit".to_string()
        }
    }
}

fn render_idle(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Unlock Elite Soccer Predictions",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Analyzes H2H records, team form and standings through a grounded AI model."),
        Line::from(""),
        Line::from("  [s] Start Standard Analysis"),
        Line::from("  [z] First Half 0:0 Sniper"),
        Line::from(""),
    ];

    if state.custom_matches.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("No custom matches: the model picks {MAX_MATCHES} from today's schedule."),
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.push(Line::from(format!(
            "Custom matches ({}/{MAX_MATCHES}, standard mode only):",
            state.custom_matches.len()
        )));
        for (idx, m) in state.custom_matches.iter().enumerate() {
            lines.push(Line::from(format!("  {}. {m}", idx + 1)));
        }
    }

    if let InputMode::AddingMatch { buffer } = &state.input {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Match: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{buffer}_")),
        ]));
    }

    let body = Paragraph::new(lines)
        .block(Block::default().title("Home").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(body, area);
}

fn render_loading(frame: &mut Frame, area: Rect, state: &AppState) {
    let step = state.loading_step(Instant::now());
    let mut lines = vec![
        Line::from(Span::styled(
            "Generating Predictions",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (idx, text) in LOADING_STEPS.iter().enumerate() {
        let (marker, style) = if idx < step {
            ("[x]", Style::default().fg(Color::DarkGray))
        } else if idx == step {
            ("[>]", Style::default().fg(Color::Green))
        } else {
            ("[ ]", Style::default().fg(Color::DarkGray))
        };
        lines.push(Line::from(Span::styled(format!("{marker} {text}"), style)));
    }

    let body = Paragraph::new(lines).block(
        Block::default()
            .title(format!("{} analysis", state.mode.label()))
            .borders(Borders::ALL),
    );
    frame.render_widget(body, area);
}

fn render_error(frame: &mut Frame, area: Rect, state: &AppState) {
    let message = state
        .error
        .clone()
        .unwrap_or_else(|| "Unable to connect to prediction engine.".to_string());
    let lines = vec![
        Line::from(Span::styled(
            "Analysis Failed",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message),
        Line::from(""),
        Line::from("[r] Retry Analysis"),
    ];
    let body = Paragraph::new(lines)
        .block(Block::default().title("Error").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(body, area);
}

fn render_results(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let title = match state.mode {
        GenerationMode::Sniper => "First Half 0:0 Locks: high-probability defensive standoffs",
        GenerationMode::Standard => "Today's Top Picks",
    };
    let title = Paragraph::new(title).style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(title, sections[0]);

    let list_area = sections[1];
    if state.predictions.is_empty() {
        let empty = Paragraph::new("No predictions parsed from the response. Press r to retry.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let inner_width = list_area.width.saturating_sub(2).max(1);
    let heights = state
        .predictions
        .iter()
        .map(|p| card_height(p, state.is_expanded(&p.id), inner_width))
        .collect::<Vec<_>>();
    let start = first_visible_card(&heights, state.selected, list_area.height);

    let mut y = list_area.y;
    let bottom = list_area.y + list_area.height;
    for (idx, p) in state.predictions.iter().enumerate().skip(start) {
        if y >= bottom {
            break;
        }
        let height = heights[idx].min(bottom - y);
        let card_area = Rect {
            x: list_area.x,
            y,
            width: list_area.width,
            height,
        };
        render_card(
            frame,
            card_area,
            p,
            idx,
            idx == state.selected,
            state.is_expanded(&p.id),
        );
        y += height;
    }
}

const COLLAPSED_CARD_HEIGHT: u16 = 6;

fn card_height(p: &Prediction, expanded: bool, inner_width: u16) -> u16 {
    if !expanded {
        return COLLAPSED_CARD_HEIGHT;
    }
    let extra = expanded_lines(p)
        .iter()
        .map(|line| wrapped_rows(line, inner_width))
        .fold(0u16, u16::saturating_add);
    COLLAPSED_CARD_HEIGHT.saturating_add(extra)
}

fn wrapped_rows(text: &str, width: u16) -> u16 {
    let chars = text.chars().count().max(1);
    chars.div_ceil(width as usize).min(u16::MAX as usize) as u16
}

// Walks back from the selection until the viewport is full.
fn first_visible_card(heights: &[u16], selected: usize, viewport: u16) -> usize {
    let mut start = selected.min(heights.len().saturating_sub(1));
    let mut used = heights.get(start).copied().unwrap_or(0);
    while start > 0 {
        let prev = heights[start - 1];
        let next = used.saturating_add(prev);
        if next > viewport {
            break;
        }
        used = next;
        start -= 1;
    }
    start
}

fn expanded_lines(p: &Prediction) -> Vec<String> {
    let mut lines = vec![
        format!("Reasoning: {}", p.reasoning),
        format!("H2H: {}", p.h2h_summary),
        format!("Table: {}", p.standings_summary),
    ];
    if !p.grounding_urls.is_empty() {
        lines.push("Sources:".to_string());
        for (i, url) in p.grounding_urls.iter().enumerate() {
            lines.push(format!("  [{}] {url}", i + 1));
        }
    }
    lines
}

fn render_card(
    frame: &mut Frame,
    area: Rect,
    p: &Prediction,
    index: usize,
    selected: bool,
    expanded: bool,
) {
    let accent = tier_color(p.tier());
    let border_style = if selected {
        Style::default().fg(accent)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .title(format!(" #{} {} ", index + 1, p.league))
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let time = Paragraph::new(p.match_time.as_str()).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(time, rows[0]);

    let away = if p.away_team.is_empty() { "?" } else { p.away_team.as_str() };
    let teams = Paragraph::new(Line::from(vec![
        Span::styled(
            p.home_team.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled("  VS  ", Style::default().fg(Color::DarkGray)),
        Span::styled(away.to_string(), Style::default().add_modifier(Modifier::BOLD)),
    ]));
    frame.render_widget(teams, rows[1]);

    let market = Paragraph::new(Line::from(vec![
        Span::raw("AI Prediction: "),
        Span::styled(
            p.prediction_market.clone(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
    ]));
    frame.render_widget(market, rows[2]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(accent).bg(Color::Black))
        .percent(p.confidence.clamp(0, 100) as u16)
        .label(format!("Confidence {}%", p.confidence));
    frame.render_widget(gauge, rows[3]);

    if expanded {
        let text = expanded_lines(p).join("\n");
        let analysis = Paragraph::new(text)
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: false });
        frame.render_widget(analysis, rows[4]);
    }
}

fn tier_color(tier: ConfidenceTier) -> Color {
    match tier {
        ConfidenceTier::Elite => Color::Green,
        ConfidenceTier::Strong => Color::Blue,
        ConfidenceTier::Moderate => Color::Yellow,
    }
}

fn status_label(status: PredictionState) -> &'static str {
    match status {
        PredictionState::Idle => "IDLE",
        PredictionState::Loading => "LOADING",
        PredictionState::Success => "SUCCESS",
        PredictionState::Error => "ERROR",
    }
}

fn console_text(state: &state::AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "GoalKick Terminal - Help",
        "",
        "Home:",
        "  s            Standard analysis",
        "  z            First Half 0:0 sniper",
        "  a            Add a custom match (e.g. Arsenal vs Chelsea)",
        "  x            Clear custom matches",
        "",
        "Results:",
        "  j/k or ↑/↓   Move between cards",
        "  Enter/Space  Expand analysis",
        "  r            Refresh / retry",
        "  b / Esc      Back to home",
        "",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Predictions are generated by AI. Sports outcomes are unpredictable.",
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

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
