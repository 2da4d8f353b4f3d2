use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io::Stdout;
use tokio::time::Duration;

use crate::config::Config;
use crate::ui::conversation::{ConversationAction, ConversationManager};

/// Run the chat TUI until the user quits.
pub async fn run(config: Config) -> Result<()> {
    let mut manager = ConversationManager::new(&config);
    manager.set_focus(true);

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = run_loop(&mut terminal, &mut manager).await;

    // Always restore the terminal, even if the loop failed.
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    manager: &mut ConversationManager,
) -> Result<()> {
    loop {
        manager.process_exchanges();

        terminal
            .draw(|frame| draw(frame, manager))
            .context("Failed to draw frame")?;

        if !event::poll(Duration::from_millis(50)).context("Failed to poll terminal events")? {
            continue;
        }

        if let Event::Key(key) = event::read().context("Failed to read terminal event")? {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(());
            }
            if manager.handle_key(key)? == ConversationAction::Exit {
                return Ok(());
            }
        }
    }
}

fn draw(frame: &mut Frame, manager: &ConversationManager) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Conversation
        ])
        .split(frame.size());

    let mut header_spans = vec![
        Span::styled(
            "Financial Results Analyzer",
            Style::default().fg(Color::White),
        ),
        Span::raw("  "),
        Span::styled(
            format!("[{}]", manager.company().display_name()),
            Style::default().fg(Color::Cyan),
        ),
    ];
    if manager.is_loading() {
        header_spans.push(Span::styled(
            "  waiting for backend...",
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(Line::from(header_spans))
        .block(Block::default().borders(Borders::ALL).title("finchat"));
    frame.render_widget(header, chunks[0]);

    manager.render(chunks[1], frame.buffer_mut());
}
