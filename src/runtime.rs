//! Runtime for executing conversations
//!
//! Each user gets one worker task fed by an mpsc queue, so steps for the same
//! user never interleave while distinct users proceed in parallel. A worker
//! whose queue stays empty for the idle timeout exits and is respawned on the
//! user's next update.

mod error;
mod executor;
pub mod reply;
pub mod traits;


pub use error::StoreError;
pub use executor::Controller;
#[allow(unused_imports)] // Public API re-exports
pub use reply::{KeyboardHint, Reply, WordListEntry};
pub use traits::*;

use crate::state_machine::{Command, Input};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};

/// Type alias for the production manager
pub type ProductionManager = ConversationManager<DatabaseStorage>;

const QUEUE_CAPACITY: usize = 32;
const WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to resolve user: {0}")]
    Identity(#[from] StoreError),
    #[error("conversation worker for user {0} stopped")]
    WorkerStopped(i64),
}

/// One queued step and the channel its reply goes back on
struct Job {
    input: Input,
    reply_tx: oneshot::Sender<Reply>,
}

/// Manager for all per-user conversation workers
pub struct ConversationManager<S: Storage + 'static> {
    controller: Arc<Controller<S>>,
    workers: RwLock<HashMap<i64, mpsc::Sender<Job>>>,
    idle_timeout: Duration,
}

impl<S: Storage + 'static> ConversationManager<S> {
    pub fn new(storage: S, page_size: usize) -> Self {
        Self {
            controller: Arc::new(Controller::new(storage, page_size)),
            workers: RwLock::new(HashMap::new()),
            idle_timeout: WORKER_IDLE_TIMEOUT,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Resolve the sender and run one conversation step for them.
    ///
    /// A `START` from a user seen for the first time gets the first-contact
    /// greeting; their state is already `default`.
    pub async fn dispatch(&self, external_id: i64, input: Input) -> Result<Reply, DispatchError> {
        let (user_id, created) = self.controller.storage().resolve_user(external_id).await?;

        if created && input == Input::Command(Command::Start) {
            return Ok(Reply::new(reply::GREET).with_keyboard(KeyboardHint::Start));
        }

        self.send(user_id, input).await
    }

    /// Queue a step for an already resolved user and wait for its reply
    pub async fn send(&self, user_id: i64, input: Input) -> Result<Reply, DispatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = Job { input, reply_tx };

        // A worker may retire between lookup and send; respawn once
        if let Err(mpsc::error::SendError(job)) = self.get_or_spawn(user_id).await.send(job).await {
            if self.get_or_spawn(user_id).await.send(job).await.is_err() {
                self.workers.write().await.remove(&user_id);
                return Err(DispatchError::WorkerStopped(user_id));
            }
        }

        reply_rx
            .await
            .map_err(|_| DispatchError::WorkerStopped(user_id))
    }

    async fn get_or_spawn(&self, user_id: i64) -> mpsc::Sender<Job> {
        if let Some(tx) = self.workers.read().await.get(&user_id) {
            if !tx.is_closed() {
                return tx.clone();
            }
        }

        let mut workers = self.workers.write().await;
        // Another caller may have spawned it while we waited for the lock
        if let Some(tx) = workers.get(&user_id) {
            if !tx.is_closed() {
                return tx.clone();
            }
        }
        workers.retain(|_, tx| !tx.is_closed());

        let (tx, rx) = mpsc::channel::<Job>(QUEUE_CAPACITY);
        tokio::spawn(run_worker(
            Arc::clone(&self.controller),
            user_id,
            rx,
            self.idle_timeout,
        ));

        workers.insert(user_id, tx.clone());
        tx
    }

    #[allow(dead_code)] // Used in tests
    pub async fn worker_count(&self) -> usize {
        self.workers
            .read()
            .await
            .values()
            .filter(|tx| !tx.is_closed())
            .count()
    }
}

async fn run_worker<S: Storage + 'static>(
    controller: Arc<Controller<S>>,
    user_id: i64,
    mut rx: mpsc::Receiver<Job>,
    idle_timeout: Duration,
) {
    tracing::debug!(user_id, "Starting conversation worker");
    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(job)) => run_job(&controller, user_id, job).await,
            Ok(None) => break,
            Err(_) => {
                // Refuse new jobs, then finish whatever was already queued
                rx.close();
                while let Ok(job) = rx.try_recv() {
                    run_job(&controller, user_id, job).await;
                }
                break;
            }
        }
    }
    tracing::debug!(user_id, "Conversation worker finished");
}

async fn run_job<S: Storage + 'static>(controller: &Controller<S>, user_id: i64, job: Job) {
    let reply = controller.handle(user_id, job.input).await;
    // Caller may have gone away; the step is already committed
    let _ = job.reply_tx.send(reply);
}
