use super::log_pass;
use crate::application::process_batch::ProcessBatchUseCase;
use crate::domain::entities::message::Message;
use crate::infrastructure::sqlite::message_repo::SqliteMessageRepo;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A push from the ingestion channel. An empty `messages` list only asks for
/// a pass over whatever the source already holds.
#[derive(Debug, Clone)]
pub struct Notification {
    pub source_id: String,
    pub messages: Vec<Message>,
}

impl Notification {
    pub fn poke(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            messages: Vec::new(),
        }
    }

    pub fn with_messages(source_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            source_id: source_id.into(),
            messages,
        }
    }
}

pub type NotificationSender = mpsc::Sender<Notification>;

/// Receives notifications and hands each one to the batch use case. Pushed
/// messages are stored first so a failed pass can resume from the source.
pub struct Notifier {
    use_case: Arc<ProcessBatchUseCase>,
    store: Arc<SqliteMessageRepo>,
    rx: mpsc::Receiver<Notification>,
}

impl Notifier {
    pub fn channel(
        use_case: Arc<ProcessBatchUseCase>,
        store: Arc<SqliteMessageRepo>,
        capacity: usize,
    ) -> (NotificationSender, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { use_case, store, rx })
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until every sender is dropped.
    pub async fn run(mut self) {
        info!("notifier started");
        let mut tasks = Vec::new();
        while let Some(notification) = self.rx.recv().await {
            let Notification { source_id, mut messages } = notification;
            if let Err(e) = messages
                .iter_mut()
                .try_for_each(|m| self.store.upsert(m).map(|revision| m.revision = revision))
            {
                warn!(source_id = %source_id, error = %e, "failed to store pushed messages");
                continue;
            }
            let use_case = Arc::clone(&self.use_case);
            tasks.push(tokio::spawn(async move {
                let result = if messages.is_empty() {
                    use_case.run_pass(&source_id).await
                } else {
                    use_case.process_batch(&source_id, messages).await
                };
                log_pass("notify", &source_id, result);
            }));
            tasks.retain(|t| !t.is_finished());
        }
        for task in tasks {
            let _ = task.await;
        }
        info!("notifier stopped");
    }
}
