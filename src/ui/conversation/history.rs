//! In-memory conversation store and its scrollback rendering

use crate::events::{ChatRole, Company, TranscriptEntry};
use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::collections::VecDeque;

/// A single message in the conversation
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub role: ChatRole,
    pub content: String,
    pub company: Company,
    pub timestamp: DateTime<Utc>,
    pub is_error: bool,
}

/// Ordered store of chat messages plus its display state.
///
/// Messages are immutable once appended; removal exists only so the
/// transient rate-limit notice can be expired when its retry fires.
#[derive(Clone)]
pub struct ConversationHistory {
    messages: VecDeque<ChatMessage>,
    next_id: u64,
    max_messages: usize,
    show_timestamps: bool,
    pending: bool,
}

impl ConversationHistory {
    pub fn new(max_messages: usize, show_timestamps: bool) -> Self {
        Self {
            messages: VecDeque::new(),
            next_id: 1,
            max_messages,
            show_timestamps,
            pending: false,
        }
    }

    fn push(&mut self, role: ChatRole, content: String, company: Company, is_error: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.messages.push_back(ChatMessage {
            id,
            role,
            content,
            company,
            timestamp: Utc::now(),
            is_error,
        });

        if self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }

        id
    }

    /// Append a user question
    pub fn add_user_message(&mut self, content: String, company: Company) -> u64 {
        self.push(ChatRole::User, content, company, false)
    }

    /// Append a bot answer
    pub fn add_bot_message(&mut self, content: String, company: Company) -> u64 {
        self.push(ChatRole::Bot, content, company, false)
    }

    /// Append a bot-side error notice
    pub fn add_error_message(&mut self, content: String, company: Company) -> u64 {
        self.push(ChatRole::Bot, content, company, true)
    }

    /// Remove a message by id. Used to expire the transient
    /// "retrying" notice; a miss is not an error.
    pub fn remove_message(&mut self, id: u64) {
        self.messages.retain(|message| message.id != id);
    }

    /// Clear all messages
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    #[allow(dead_code)]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)]
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Whether a request is in flight (renders the thinking indicator)
    pub fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    #[allow(dead_code)]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Snapshot the conversation for persistence.
    pub fn to_transcript_entries(&self) -> Vec<TranscriptEntry> {
        self.messages
            .iter()
            .map(|message| TranscriptEntry {
                role: message.role,
                content: message.content.clone(),
                company: message.company,
                timestamp: message.timestamp,
                is_error: message.is_error,
            })
            .collect()
    }

    /// Render the scrollback panel, bottom-anchored.
    pub fn render(&self, area: Rect, buf: &mut Buffer, company: Company) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() && !self.pending {
            let welcome_lines = vec![
                Line::from(vec![Span::styled(
                    "Start a conversation",
                    Style::default().fg(Color::Green),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    format!("Ask any question about {}", company.display_name()),
                    Style::default().fg(Color::Gray),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Enter sends, Shift+Enter adds a line, / opens commands.",
                    Style::default().fg(Color::DarkGray),
                )]),
            ];

            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages.iter() {
            let mut lines = self.render_message(message, inner_area.width);
            all_lines.append(&mut lines);
            all_lines.push(Line::from(vec![Span::raw("")]));
        }

        if self.pending {
            all_lines.push(thinking_line());
        }

        // Show the most recent lines that fit.
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let start = total.saturating_sub(height);
        let visible = &all_lines[start..];

        for (i, line) in visible.iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }

    /// Render a single message into lines
    fn render_message(&self, message: &ChatMessage, width: u16) -> Vec<Line> {
        let mut lines = Vec::new();

        let role_icon = match message.role {
            ChatRole::User => "👤",
            ChatRole::Bot => "🤖",
        };

        let mut header = role_icon.to_string();
        if message.role == ChatRole::User {
            header.push_str(&format!(" To: {}", message.company.display_name()));
        }
        if self.show_timestamps {
            header.push_str(&format!(" {}", message.timestamp.format("%H:%M:%S")));
        }
        header.push(' ');
        header.push_str(&"─".repeat(20));

        lines.push(Line::from(vec![Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        )]));

        let style = self.content_style(message);
        for content_line in wrap_text(&message.content, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, style),
            ]));
        }

        lines
    }

    fn content_style(&self, message: &ChatMessage) -> Style {
        if message.is_error {
            Style::default().fg(Color::Red)
        } else {
            match message.role {
                ChatRole::User => Style::default().fg(Color::Blue),
                ChatRole::Bot => Style::default().fg(Color::Green),
            }
        }
    }
}

fn thinking_line() -> Line<'static> {
    let dots = match (std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        / 300)
        % 4
    {
        0 => ".",
        1 => "..",
        2 => "...",
        _ => "   ",
    };

    Line::from(vec![
        Span::styled("🤖 ", Style::default().fg(Color::Green)),
        Span::styled("thinking", Style::default().fg(Color::Green)),
        Span::styled(dots, Style::default().fg(Color::Yellow)),
    ])
}

/// Wrap text to fit within the given width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 <= width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !current_line.is_empty() {
                lines.push(current_line);
                current_line = String::new();
            }
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}
