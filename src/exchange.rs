use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::backend::{BackendClient, BackendError};
use crate::events::Company;

/// Events emitted while one submitted question is resolved.
///
/// `Answer` and `Failed` are terminal; the retry events bracket the
/// wait window during which the UI shows a transient notice.
#[derive(Debug, Clone)]
pub enum ExchangeEvent {
    /// The backend answered
    Answer { content: String },
    /// Rate limit hit on the first attempt; a retry will fire after the delay
    RetryScheduled { delay_secs: f64 },
    /// The wait elapsed and the retry request is going out
    RetryStarted,
    /// Terminal failure, already phrased for display
    Failed { message: String },
}

impl ExchangeEvent {
    #[allow(dead_code)]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExchangeEvent::Answer { .. } | ExchangeEvent::Failed { .. }
        )
    }
}

/// Spawn the request flow for one question and return its event stream.
///
/// At most one automatic retry ever fires, and only when the first
/// attempt was rate limited. The retry reuses the same question and
/// company; its own failure is terminal no matter what it says.
pub fn spawn_exchange(
    client: BackendClient,
    company: Company,
    question: String,
) -> mpsc::UnboundedReceiver<ExchangeEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        run_exchange(client, company, question, tx).await;
    });

    rx
}

async fn run_exchange(
    client: BackendClient,
    company: Company,
    question: String,
    tx: mpsc::UnboundedSender<ExchangeEvent>,
) {
    match client.ask(company, &question).await {
        Ok(content) => {
            let _ = tx.send(ExchangeEvent::Answer { content });
        }
        Err(BackendError::RateLimited { retry_after }) => {
            tracing::info!(retry_after, "scheduling single retry");
            let _ = tx.send(ExchangeEvent::RetryScheduled {
                delay_secs: retry_after,
            });

            tokio::time::sleep(Duration::from_secs_f64(retry_after.max(0.0))).await;
            let _ = tx.send(ExchangeEvent::RetryStarted);

            match client.ask(company, &question).await {
                Ok(content) => {
                    let _ = tx.send(ExchangeEvent::Answer { content });
                }
                Err(retry_err) => {
                    tracing::warn!(error = %retry_err, "retry attempt failed");
                    let _ = tx.send(ExchangeEvent::Failed {
                        message: retry_err.user_message(),
                    });
                }
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "request failed");
            let _ = tx.send(ExchangeEvent::Failed {
                message: err.user_message(),
            });
        }
    }
}

/// One-shot variant for the CLI path: same single-retry policy, but
/// awaited in place instead of reported as events.
pub async fn ask_with_retry(
    client: &BackendClient,
    company: Company,
    question: &str,
) -> Result<String, BackendError> {
    match client.ask(company, question).await {
        Err(BackendError::RateLimited { retry_after }) => {
            tracing::info!(retry_after, "rate limit hit, retrying once");
            eprintln!("Rate limit hit. Retrying in {:.2}s...", retry_after);
            tokio::time::sleep(Duration::from_secs_f64(retry_after.max(0.0))).await;
            client.ask(company, question).await
        }
        other => other,
    }
}
