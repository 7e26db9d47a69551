//! Terminal canvas for the agent flow.
//!
//! Every registered node is drawn as a small box at its layout position,
//! colored by status. The header holds the single start control, which is
//! disabled while a stream is open.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};

use agentflow_network::StreamConnector;
use agentflow_protocol::{NodeRegistry, NodeSpec, NodeStatus, Position};

use crate::controller::{LogCategory, RunOutcome, StreamController};

const NODE_MIN_WIDTH: u16 = 12;
const NODE_MAX_WIDTH: u16 = 44;
const LOG_PANEL_HEIGHT: u16 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Start,
    Quit,
    None,
}

/// Map a key press to a console action.
pub fn key_action(code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
    match (code, modifiers) {
        (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => KeyAction::Quit,
        (KeyCode::Char('s'), _) | (KeyCode::Enter, _) => KeyAction::Start,
        _ => KeyAction::None,
    }
}

/// Box for a node centred on `position` inside `area`, clamped to stay inside it.
pub fn node_rect(area: Rect, position: Position, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let center_x = area.x as u32 + area.width as u32 * position.left.min(100) as u32 / 100;
    let center_y = area.y as u32 + area.height as u32 * position.top.min(100) as u32 / 100;

    let max_x = (area.x + area.width - width) as u32;
    let max_y = (area.y + area.height - height) as u32;
    let x = center_x
        .saturating_sub(width as u32 / 2)
        .clamp(area.x as u32, max_x);
    let y = center_y
        .saturating_sub(height as u32 / 2)
        .clamp(area.y as u32, max_y);

    Rect::new(x as u16, y as u16, width, height)
}

pub fn status_color(status: NodeStatus) -> Color {
    match status {
        NodeStatus::Idle => Color::DarkGray,
        NodeStatus::Active => Color::Yellow,
        NodeStatus::Inactive => Color::Gray,
        NodeStatus::Complete => Color::Green,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Render the whole console: header, canvas and activity log.
pub fn render<C: StreamConnector>(
    frame: &mut Frame,
    controller: &StreamController<C>,
    registry: &NodeRegistry,
) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                // Header
            Constraint::Min(10),                  // Canvas
            Constraint::Length(LOG_PANEL_HEIGHT), // Activity log
        ])
        .split(frame.area());

    render_header(frame, outer[0], controller);
    render_canvas(frame, outer[1], controller, registry);
    render_log(frame, outer[2], controller);
}

fn render_header<C: StreamConnector>(frame: &mut Frame, area: Rect, controller: &StreamController<C>) {
    let block = Block::default()
        .title(" Agent Flow Visualization ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let button = if controller.is_streaming() {
        Span::styled(
            " Simulation in Progress... ",
            Style::default().fg(Color::DarkGray).bg(Color::Black),
        )
    } else {
        Span::styled(
            " [s] Start Simulation ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    };

    let outcome = match controller.last_outcome() {
        Some(RunOutcome::Completed) => Span::styled("  Last run: complete", Style::default().fg(Color::Green)),
        Some(RunOutcome::Failed(_)) => Span::styled("  Last run: stream failed", Style::default().fg(Color::Red)),
        None => Span::raw(""),
    };

    let line = Line::from(vec![
        Span::raw(" "),
        button,
        outcome,
        Span::styled("  |  Stream: ", Style::default().fg(Color::Gray)),
        Span::styled(controller.connector().endpoint(), Style::default().fg(Color::White)),
        Span::styled("  |  [q] quit", Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_canvas<C: StreamConnector>(
    frame: &mut Frame,
    area: Rect,
    controller: &StreamController<C>,
    registry: &NodeRegistry,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width < NODE_MIN_WIDTH || inner.height < 3 {
        return;
    }

    for node in registry.iter() {
        render_node(frame, inner, node, controller);
    }
}

fn render_node<C: StreamConnector>(
    frame: &mut Frame,
    canvas: Rect,
    node: &NodeSpec,
    controller: &StreamController<C>,
) {
    let view = controller.view();
    let status = view.status_of(node.name);
    let color = status_color(status);
    let name = node.display_name();

    let mut lines = vec![Line::from(Span::styled(
        name.clone(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))];

    if status == NodeStatus::Active {
        let max_chars = (NODE_MAX_WIDTH - 2) as usize;
        if let Some(tool) = view.get(node.name).and_then(|s| s.tool.as_deref()) {
            lines.push(Line::from(Span::styled(
                truncate(&format!("⚙ {tool}"), max_chars),
                Style::default().fg(Color::Magenta),
            )));
        }
        let message = view.message_of(node.name);
        if !message.is_empty() {
            lines.push(Line::from(Span::styled(
                truncate(message, max_chars),
                Style::default().fg(Color::White),
            )));
        }
    }

    let content_width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
    let width = (content_width + 2).clamp(NODE_MIN_WIDTH, NODE_MAX_WIDTH);
    let height = lines.len() as u16 + 2;
    let rect = node_rect(canvas, node.position, width, height);

    let border = if status == NodeStatus::Active {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(color)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(format!(" {status} "), Style::default().fg(color)));

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

fn render_log<C: StreamConnector>(frame: &mut Frame, area: Rect, controller: &StreamController<C>) {
    let block = Block::default()
        .title(" Activity ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let visible = area.height.saturating_sub(2) as usize;
    let entries: Vec<_> = controller.log().rev().take(visible).collect();
    let lines: Vec<Line> = entries
        .into_iter()
        .rev()
        .map(|entry| {
            let color = match entry.category {
                LogCategory::Run => Color::Cyan,
                LogCategory::Event => Color::White,
                LogCategory::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    format!(" {} ", entry.timestamp.format("%H:%M:%S")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(entry.message.clone(), Style::default().fg(color)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the interactive canvas until the user quits.
///
/// Each tick drains the stream into the controller, redraws, then polls the
/// keyboard for up to `tick_rate`.
pub async fn run_console<C: StreamConnector>(
    mut controller: StreamController<C>,
    registry: NodeRegistry,
    tick_rate: Duration,
) -> Result<(), anyhow::Error> {
    use std::io::IsTerminal;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(anyhow::anyhow!(
            "The agent flow console requires a terminal (TTY); use --headless instead."
        ));
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut controller, &registry, tick_rate).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop<C: StreamConnector>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    controller: &mut StreamController<C>,
    registry: &NodeRegistry,
    tick_rate: Duration,
) -> Result<(), anyhow::Error> {
    loop {
        controller.pump();

        terminal.draw(|frame| render(frame, controller, registry))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key_action(key.code, key.modifiers) {
                    KeyAction::Quit => break,
                    KeyAction::Start => {
                        // the control is disabled while streaming
                        controller.start();
                    }
                    KeyAction::None => {}
                }
            }
        }

        // let the reader task make progress on a current-thread runtime
        tokio::task::yield_now().await;
    }

    if controller.is_streaming() {
        tracing::info!("console closed with an open stream");
    }
    Ok(())
}
