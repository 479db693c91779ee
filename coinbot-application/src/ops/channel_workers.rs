use std::collections::HashMap;

use coinbot_domain::{ChannelRef, MessageCreated, ReactionEvent};
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{error, info, warn};

use crate::commands::checkpoint_commands::{record_message, report_error};
use crate::commands::reconcile_commands::reconcile_channel;
use crate::commands::reward_commands::handle_reaction_added;
use crate::{AppError, AppState};

#[derive(Debug, Clone)]
pub enum ChannelJob {
    Reconcile(ChannelRef),
    MessageCreated(MessageCreated),
    Reaction(ReactionEvent),
}

impl ChannelJob {
    fn is_live(&self) -> bool {
        !matches!(self, ChannelJob::Reconcile(_))
    }
}

/// One worker task per channel. Jobs for a channel run strictly in
/// submission order; distinct channels run independently.
#[derive(Default)]
pub struct ChannelWorkers {
    senders: RwLock<HashMap<u64, mpsc::UnboundedSender<ChannelJob>>>,
    /// Live jobs parked while reconciliations are being queued.
    held: Mutex<Option<Vec<(u64, ChannelJob)>>>,
}

impl ChannelWorkers {
    pub async fn submit(&self, state: &AppState, channel_id: u64, job: ChannelJob) {
        if state.shutdown.is_triggered() {
            return;
        }
        let mut held = self.held.lock().await;
        if let Some(parked) = held.as_mut() {
            if job.is_live() {
                parked.push((channel_id, job));
                return;
            }
        }
        self.enqueue(state, channel_id, job).await;
    }

    /// Parks live jobs until the next [`ChannelWorkers::reconcile_all`]
    /// has queued its reconciliations, so no live message can move a
    /// checkpoint ahead of the catch-up scan.
    pub async fn hold_live_jobs(&self) {
        let mut held = self.held.lock().await;
        if held.is_none() {
            *held = Some(Vec::new());
        }
    }

    /// Queues a reconciliation for every text channel the platform reports,
    /// then releases any live jobs parked meanwhile.
    pub async fn reconcile_all(&self, state: &AppState) -> Result<usize, AppError> {
        self.hold_live_jobs().await;
        let result = match state.platform.text_channels().await {
            Ok(channels) => {
                let count = channels.len();
                for channel in channels {
                    let channel_id = channel.channel_id;
                    self.submit(state, channel_id, ChannelJob::Reconcile(channel))
                        .await;
                }
                Ok(count)
            }
            Err(err) => Err(err.into()),
        };
        self.release_live_jobs(state).await;
        result
    }

    async fn release_live_jobs(&self, state: &AppState) {
        let mut held = self.held.lock().await;
        let parked = held.take().unwrap_or_default();
        if !parked.is_empty() {
            info!("releasing {} live jobs held during reconciliation", parked.len());
        }
        for (channel_id, job) in parked {
            if state.shutdown.is_triggered() {
                break;
            }
            self.enqueue(state, channel_id, job).await;
        }
    }

    async fn enqueue(&self, state: &AppState, channel_id: u64, job: ChannelJob) {
        {
            let senders = self.senders.read().await;
            if let Some(tx) = senders.get(&channel_id) {
                if tx.send(job.clone()).is_ok() {
                    return;
                }
            }
        }

        let mut senders = self.senders.write().await;
        let tx = senders.entry(channel_id).or_insert_with(|| spawn_worker(state.clone(), channel_id));
        if let Err(err) = tx.send(job) {
            // Worker exited; start a fresh one for the job.
            let tx = spawn_worker(state.clone(), channel_id);
            let _ = tx.send(err.0);
            senders.insert(channel_id, tx);
        }
    }

    pub async fn active_channels(&self) -> usize {
        self.senders.read().await.len()
    }

    /// Drops every queue; workers finish their current job and exit.
    pub async fn close_all(&self) {
        self.held.lock().await.take();
        self.senders.write().await.clear();
    }
}

fn spawn_worker(state: AppState, channel_id: u64) -> mpsc::UnboundedSender<ChannelJob> {
    let (tx, mut rx) = mpsc::unbounded_channel::<ChannelJob>();
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            if state.shutdown.is_triggered() {
                break;
            }
            run_job(&state, channel_id, job).await;
        }
    });
    tx
}

async fn run_job(state: &AppState, channel_id: u64, job: ChannelJob) {
    let result = match job {
        ChannelJob::Reconcile(channel) => reconcile_channel(state, &channel).await.map(|_| ()),
        ChannelJob::MessageCreated(message) => record_message(state, &message).await,
        ChannelJob::Reaction(event) => handle_reaction_added(state, &event).await.map(|_| ()),
    };
    let Err(err) = result else {
        return;
    };
    if err.is_fatal() {
        error!("channel {} stopped on fatal error: {}", channel_id, err);
        return;
    }
    warn!("channel {} job failed: {}", channel_id, err);
    if err.needs_administrator() {
        report_error(state, channel_id, &err).await;
    }
}
