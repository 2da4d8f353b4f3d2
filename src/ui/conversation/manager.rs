use crate::backend::BackendClient;
use crate::config::Config;
use crate::events::Company;
use crate::exchange::{spawn_exchange, ExchangeEvent};
use crate::transcript::TranscriptStore;
use crate::ui::conversation::commands::{get_help_text, ParsedCommand, SlashCommand};
use crate::ui::conversation::{ComposerResult, ConversationComposer, ConversationHistory};
use anyhow::Result;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
};
use tokio::sync::mpsc;

/// Actions the manager asks the app loop to take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// One submitted question still being resolved.
///
/// Each submission owns its event stream and its transient-notice id,
/// so overlapping retries never remove another question's notice.
struct PendingExchange {
    rx: mpsc::UnboundedReceiver<ExchangeEvent>,
    company: Company,
    notice_id: Option<u64>,
    done: bool,
}

/// Owns the conversation flow: store, composer, and in-flight requests
pub struct ConversationManager {
    history: ConversationHistory,
    composer: ConversationComposer,
    client: BackendClient,
    transcripts: TranscriptStore,
    company: Company,
    pending: Vec<PendingExchange>,
}

impl ConversationManager {
    pub fn new(config: &Config) -> Self {
        let company = config.default_company;
        Self {
            history: ConversationHistory::new(config.ui.max_history, config.ui.show_timestamps),
            composer: ConversationComposer::new(company),
            client: BackendClient::new(config),
            transcripts: TranscriptStore::new(config.transcripts_dir.clone()),
            company,
            pending: Vec::new(),
        }
    }

    /// Submit a question. Blank input is a no-op: no message, no request.
    pub fn handle_input(&mut self, input: String) {
        if input.trim().is_empty() {
            return;
        }

        self.history.add_user_message(input.clone(), self.company);
        self.history.set_pending(true);

        let rx = spawn_exchange(self.client.clone(), self.company, input);
        self.pending.push(PendingExchange {
            rx,
            company: self.company,
            notice_id: None,
            done: false,
        });
    }

    /// Drain exchange events without blocking (called from the app loop).
    pub fn process_exchanges(&mut self) {
        for exchange in self.pending.iter_mut() {
            loop {
                match exchange.rx.try_recv() {
                    Ok(ExchangeEvent::Answer { content }) => {
                        self.history.add_bot_message(content, exchange.company);
                        exchange.done = true;
                        break;
                    }
                    Ok(ExchangeEvent::RetryScheduled { delay_secs }) => {
                        let notice = format!("Rate limit hit. Retrying in {:.2}s...", delay_secs);
                        let id = self.history.add_error_message(notice, exchange.company);
                        exchange.notice_id = Some(id);
                    }
                    Ok(ExchangeEvent::RetryStarted) => {
                        if let Some(id) = exchange.notice_id.take() {
                            self.history.remove_message(id);
                        }
                    }
                    Ok(ExchangeEvent::Failed { message }) => {
                        self.history.add_error_message(message, exchange.company);
                        exchange.done = true;
                        break;
                    }
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        exchange.done = true;
                        break;
                    }
                }
            }
        }

        self.pending.retain(|exchange| !exchange.done);
        self.history.set_pending(!self.pending.is_empty());
    }

    /// Handle key input from the terminal
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> Result<ConversationAction> {
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.handle_input(input);
                Ok(ConversationAction::None)
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => Ok(ConversationAction::None),
        }
    }

    /// Switch the company for subsequent questions. Existing messages
    /// keep their tags; nothing is cleared.
    pub fn set_company(&mut self, company: Company) {
        self.company = company;
        self.composer.set_focus(true);
        self.composer.set_company(company);
    }

    pub fn company(&self) -> Company {
        self.company
    }

    pub fn set_focus(&mut self, has_focus: bool) {
        self.composer.set_focus(has_focus);
    }

    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    #[allow(dead_code)]
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    fn handle_slash_command(&mut self, command: ParsedCommand) -> Result<ConversationAction> {
        match command.command {
            SlashCommand::Company => {
                match command.company_target() {
                    Some(company) => self.set_company(company),
                    None => {
                        self.history.add_error_message(
                            format!(
                                "Unknown company '{}'. Try bajaj, tcs, axis, godrej or reliance.",
                                command.argument().unwrap_or("")
                            ),
                            self.company,
                        );
                    }
                }
                Ok(ConversationAction::None)
            }
            SlashCommand::Clear => {
                self.history.clear();
                Ok(ConversationAction::None)
            }
            SlashCommand::Save => {
                match self.transcripts.save(self.history.to_transcript_entries()) {
                    Ok(path) => {
                        self.history.add_bot_message(
                            format!("Transcript saved to {}", path.display()),
                            self.company,
                        );
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to save transcript");
                        self.history
                            .add_error_message("Failed to save transcript.".into(), self.company);
                    }
                }
                Ok(ConversationAction::None)
            }
            SlashCommand::Help => {
                self.history.add_bot_message(get_help_text(), self.company);
                Ok(ConversationAction::None)
            }
            SlashCommand::Quit => Ok(ConversationAction::Exit),
        }
    }

    /// Render history and composer into the given area
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),   // History
                Constraint::Length(4), // Composer
            ])
            .split(area);

        self.history.render(chunks[0], buf, self.company);

        use ratatui::widgets::Widget;
        self.composer.clone().render(chunks[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChatRole;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager_for(endpoint: &str) -> ConversationManager {
        let mut config = Config::default();
        config.endpoint = endpoint.to_string();
        config.request_timeout_secs = 5;
        config.transcripts_dir = std::env::temp_dir().join("finchat-manager-tests");
        ConversationManager::new(&config)
    }

    async fn settle(manager: &mut ConversationManager) {
        // Give the spawned exchange time to finish, then drain events.
        for _ in 0..100 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            manager.process_exchanges();
            if !manager.is_loading() {
                return;
            }
        }
        panic!("exchange never settled");
    }

    #[tokio::test]
    async fn blank_input_appends_nothing() {
        let mut manager = manager_for("http://127.0.0.1:9/ask");
        manager.handle_input("   \n  ".to_string());
        assert_eq!(manager.history().message_count(), 0);
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn successful_exchange_appends_one_bot_message_and_clears_loading() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"answer": "Profit rose 12%."})),
            )
            .mount(&server)
            .await;

        let mut manager = manager_for(&format!("{}/ask", server.uri()));
        manager.handle_input("profit?".to_string());
        assert!(manager.is_loading());

        settle(&mut manager).await;

        let messages: Vec<_> = manager.history().messages().collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[1].role, ChatRole::Bot);
        assert_eq!(messages[1].content, "Profit rose 12%.");
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn rate_limit_shows_then_expires_transient_notice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": "try again in 0.2s"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"answer": "All good."})),
            )
            .mount(&server)
            .await;

        let mut manager = manager_for(&format!("{}/ask", server.uri()));
        manager.handle_input("q?".to_string());

        // Wait for the transient notice to show up during the retry window.
        let mut saw_notice = false;
        for _ in 0..50 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            manager.process_exchanges();
            if manager
                .history()
                .messages()
                .any(|m| m.is_error && m.content.contains("Retrying in"))
            {
                saw_notice = true;
                break;
            }
        }
        assert!(saw_notice, "transient retry notice never appeared");
        assert!(manager.is_loading(), "loading must persist through the retry");

        settle(&mut manager).await;

        // Notice expired, answer appended, loading cleared after the retry.
        let messages: Vec<_> = manager.history().messages().collect();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| !m.content.contains("Retrying in")));
        assert_eq!(messages[1].content, "All good.");
    }

    #[tokio::test]
    async fn company_switch_leaves_existing_messages_alone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"answer": "ok"})),
            )
            .mount(&server)
            .await;

        let mut manager = manager_for(&format!("{}/ask", server.uri()));
        manager.handle_input("first".to_string());
        settle(&mut manager).await;

        manager.set_company(Company::Reliance);
        assert_eq!(manager.history().message_count(), 2);
        assert!(manager
            .history()
            .messages()
            .all(|m| m.company == Company::Bajaj));

        manager.handle_input("second".to_string());
        settle(&mut manager).await;

        let tagged: Vec<_> = manager
            .history()
            .messages()
            .filter(|m| m.company == Company::Reliance)
            .collect();
        assert_eq!(tagged.len(), 2);
    }
}
