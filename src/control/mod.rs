//! Chat control plane: per-chat setup, file uploads and the campaign slot.
//!
//! One [`ControlPlane`] serves every chat. Each chat gets its own
//! [`UserSession`]; all chats share a single [`CampaignState`], so at most
//! one campaign runs per process. Locks are released before any transport
//! call or orchestrator run.

pub mod messages;
pub mod session;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::alert::ChatAlerts;
use crate::attempt::RegistrationAttempt;
use crate::campaign::RetryPolicy;
use crate::inputs::{read_identities, read_proxies, read_targets};
use crate::orchestrator::{CampaignReport, Orchestrator};
use crate::router::{ChatCommand, FileRole, FileRoleRouter};
use crate::telegram::{ChatTransport, Message};

pub use session::{SessionStore, UserSession, WizardTransition};
pub use state::{CampaignHandle, CampaignState, Launch};

const RECENT_RESULTS: usize = 10;

/// Knobs shared by every chat.
#[derive(Debug, Clone)]
pub struct ControlSettings {
    /// Where per-chat uploads are stored.
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Used when a chat has not uploaded its own proxy list.
    pub shared_proxies: PathBuf,
    pub default_workers: usize,
    pub max_workers: usize,
    pub policy: RetryPolicy,
}

/// What a chat sent us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Text(String),
    Document { file_id: String, file_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: i64,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            kind: EventKind::Text(text.into()),
        }
    }

    pub fn document(chat_id: i64, file_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            chat_id,
            kind: EventKind::Document {
                file_id: file_id.into(),
                file_name: file_name.into(),
            },
        }
    }

    /// Documents win over captions. Messages with neither are dropped.
    pub fn from_message(msg: &Message) -> Option<Self> {
        let chat_id = msg.chat.id;
        if let Some(doc) = &msg.document {
            return Some(Self::document(
                chat_id,
                doc.file_id.clone(),
                doc.file_name.clone().unwrap_or_default(),
            ));
        }
        msg.text.as_ref().map(|t| Self::text(chat_id, t.clone()))
    }
}

pub struct ControlPlane<T, A> {
    transport: Arc<T>,
    attempt: Arc<A>,
    settings: ControlSettings,
    sessions: SessionStore,
    campaign: Arc<Mutex<CampaignState>>,
}

impl<T, A> ControlPlane<T, A>
where
    T: ChatTransport + 'static,
    A: RegistrationAttempt + 'static,
{
    pub fn new(transport: Arc<T>, attempt: Arc<A>, settings: ControlSettings) -> Self {
        let sessions = SessionStore::new(settings.data_dir.clone(), settings.default_workers);
        Self {
            transport,
            attempt,
            settings,
            sessions,
            campaign: Arc::new(Mutex::new(CampaignState::default())),
        }
    }

    pub async fn handle(&self, event: InboundEvent) {
        let chat_id = event.chat_id;
        match event.kind {
            EventKind::Text(text) => self.handle_text(chat_id, text.trim()).await,
            EventKind::Document { file_id, file_name } => {
                self.handle_upload(chat_id, &file_id, &file_name).await
            }
        }
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_text(chat_id, text).await {
            warn!(chat_id, error = %e, "failed to send reply");
        }
    }

    async fn handle_text(&self, chat_id: i64, text: &str) {
        let session = self.sessions.get_or_create(chat_id).await;

        let wizard_reply = {
            let mut s = session.lock().await;
            match s.advance_wizard(text) {
                WizardTransition::Inactive => None,
                WizardTransition::Next(next) => Some(messages::wizard_step(&s, next)),
                WizardTransition::Complete => {
                    info!(chat_id, "setup wizard completed");
                    Some(messages::setup_complete(&s))
                }
                WizardTransition::Rejected(state) => Some(messages::wizard_rejected(state)),
            }
        };
        if let Some(reply) = wizard_reply {
            self.reply(chat_id, &reply).await;
            return;
        }

        let command = ChatCommand::parse(text);
        debug!(chat_id, ?command, "dispatching command");
        match command {
            ChatCommand::Start => self.reply(chat_id, &messages::welcome(chat_id)).await,
            ChatCommand::Help => self.reply(chat_id, messages::help()).await,
            ChatCommand::Setup => {
                session.lock().await.begin_wizard();
                self.reply(chat_id, messages::setup_started()).await;
            }
            ChatCommand::Workers(args) => self.handle_workers(chat_id, &session, &args).await,
            ChatCommand::Config => {
                let reply = messages::config(&*session.lock().await, self.settings.policy.max_attempts);
                self.reply(chat_id, &reply).await;
            }
            ChatCommand::Register => self.launch(chat_id, &session).await,
            ChatCommand::Stop => self.handle_stop(chat_id).await,
            ChatCommand::Status => self.send_status(chat_id).await,
            ChatCommand::Results => self.send_results(chat_id).await,
            ChatCommand::Stats => self.send_stats(chat_id, &session).await,
            ChatCommand::Unknown(_) => self.reply(chat_id, messages::UNKNOWN_COMMAND).await,
        }
    }

    async fn handle_workers(&self, chat_id: i64, session: &Mutex<UserSession>, args: &[String]) {
        let max = self.settings.max_workers;
        let reply = match args {
            [] => messages::workers_current(session.lock().await.concurrency, max),
            [value] => match value.parse::<usize>() {
                Ok(n) if (1..=max).contains(&n) => {
                    session.lock().await.concurrency = n;
                    info!(chat_id, workers = n, "concurrency updated");
                    messages::workers_updated(n)
                }
                _ => messages::workers_out_of_range(max),
            },
            _ => messages::WORKERS_USAGE.to_string(),
        };
        self.reply(chat_id, &reply).await;
    }

    async fn handle_upload(&self, chat_id: i64, file_id: &str, file_name: &str) {
        let Some(role) = FileRoleRouter::classify(file_name) else {
            debug!(chat_id, file_name, "unclassified upload");
            self.reply(chat_id, messages::UNKNOWN_FILE).await;
            return;
        };

        let session = self.sessions.get_or_create(chat_id).await;
        let dest = {
            let s = session.lock().await;
            match role {
                FileRole::Identities => s.identities_path.clone(),
                FileRole::Targets => s.targets_path.clone(),
                FileRole::Proxies => s.proxies_path.clone(),
            }
        };

        match self.transport.download_document(file_id, &dest).await {
            Ok(bytes) => {
                let entries = match role {
                    FileRole::Identities => read_identities(&dest).map(|v| v.len()),
                    FileRole::Targets => read_targets(&dest).map(|v| v.len()),
                    FileRole::Proxies => read_proxies(&dest).map(|v| v.len()),
                }
                .unwrap_or_default();
                info!(chat_id, role = role.label(), bytes, entries, dest = %dest.display(), "upload stored");
                self.reply(chat_id, &messages::upload_saved(role.label(), &dest, entries))
                    .await;
            }
            Err(e) => {
                warn!(chat_id, file_name, error = %e, "upload failed");
                self.reply(chat_id, &messages::upload_failed(&e.to_string())).await;
            }
        }
    }

    async fn launch(&self, chat_id: i64, session: &Mutex<UserSession>) {
        let snapshot = session.lock().await.clone();
        if !snapshot.fields.is_complete() {
            self.reply(chat_id, messages::SETUP_REQUIRED).await;
            return;
        }

        let launch = self.campaign.lock().await.try_begin();
        let Some(Launch { id: launch_id, progress }) = launch else {
            info!(chat_id, "launch rejected, campaign already running");
            self.reply(chat_id, messages::ALREADY_RUNNING).await;
            return;
        };

        let loaded = read_identities(&snapshot.identities_path)
            .map_err(|e| ("Emails", snapshot.identities_path.clone(), e.to_string()))
            .and_then(|ids| {
                read_targets(&snapshot.targets_path)
                    .map(|targets| (ids, targets))
                    .map_err(|e| ("Events", snapshot.targets_path.clone(), e.to_string()))
            })
            .and_then(|(ids, targets)| match (ids.is_empty(), targets.is_empty()) {
                (true, _) => Err(("Emails", snapshot.identities_path.clone(), "no emails found".into())),
                (_, true) => Err(("Events", snapshot.targets_path.clone(), "no event URLs found".into())),
                _ => Ok((ids, targets)),
            });
        let (identities, targets) = match loaded {
            Ok(v) => v,
            Err((label, path, reason)) => {
                self.campaign.lock().await.complete(launch_id, Vec::new());
                warn!(chat_id, path = %path.display(), %reason, "launch aborted");
                self.reply(chat_id, &messages::load_failed(label, &path, &reason)).await;
                return;
            }
        };

        let proxies_path = if snapshot.proxies_path.exists() {
            &snapshot.proxies_path
        } else {
            &self.settings.shared_proxies
        };
        let proxies = read_proxies(proxies_path).unwrap_or_else(|e| {
            warn!(error = %e, "continuing without proxies");
            Vec::new()
        });

        progress.reset(identities.len() * targets.len());
        let started = messages::campaign_started(&messages::LaunchInfo {
            session: &snapshot,
            identities: identities.len(),
            targets: targets.len(),
            proxies: proxies.len(),
        });
        self.reply(chat_id, &started).await;

        let orchestrator = Orchestrator::new(
            Arc::clone(&self.attempt),
            Arc::new(ChatAlerts::new(Arc::clone(&self.transport), chat_id)),
            snapshot.fields.clone(),
            snapshot.concurrency,
        )
        .with_retry_policy(self.settings.policy)
        .with_results_dir(self.settings.results_dir.clone());

        let transport = Arc::clone(&self.transport);
        let campaign = Arc::clone(&self.campaign);
        let task = tokio::spawn(
            async move {
                let CampaignReport {
                    run_id,
                    results,
                    summary,
                    results_file,
                } = orchestrator
                    .run(&targets, &identities, proxies, progress.as_ref())
                    .await;

                if campaign.lock().await.complete(launch_id, results) {
                    info!(chat_id, %run_id, "campaign finished");
                } else {
                    info!(chat_id, %run_id, "superseded campaign finished, results not cached");
                }

                let text = messages::campaign_completed(&summary, results_file.as_deref());
                if let Err(e) = transport.send_text(chat_id, &text).await {
                    error!(chat_id, error = %e, "failed to send completion summary");
                }
            }
            .instrument(info_span!("chat_campaign", chat_id, launch = launch_id)),
        );

        self.campaign.lock().await.track(CampaignHandle {
            launch: launch_id,
            task,
        });
        info!(chat_id, launch = launch_id, workers = snapshot.concurrency, "campaign launched");
    }

    /// Abort every unfinished campaign task. Called once, on process shutdown.
    pub async fn shutdown(&self) {
        let handles = std::mem::take(&mut self.campaign.lock().await.handles);
        for handle in handles.into_iter().filter(|h| !h.task.is_finished()) {
            warn!(launch = handle.launch, "aborting unfinished campaign");
            handle.task.abort();
        }
    }

    async fn handle_stop(&self, chat_id: i64) {
        let was_running = self.campaign.lock().await.request_stop();
        if was_running {
            info!(chat_id, "stop requested");
            self.reply(chat_id, messages::STOP_REQUESTED).await;
        } else {
            self.reply(chat_id, messages::NOT_RUNNING).await;
        }
    }

    async fn send_status(&self, chat_id: i64) {
        let reply = {
            let campaign = self.campaign.lock().await;
            if campaign.running {
                let (completed, succeeded, total) = campaign.progress.snapshot();
                Some(messages::status_running(campaign.elapsed(), completed, succeeded, total))
            } else {
                None
            }
        };
        match reply {
            Some(text) => self.reply(chat_id, &text).await,
            None => self.reply(chat_id, messages::status_idle()).await,
        }
    }

    async fn send_results(&self, chat_id: i64) {
        let reply = {
            let campaign = self.campaign.lock().await;
            (!campaign.results.is_empty())
                .then(|| messages::recent_results(&campaign.results, RECENT_RESULTS))
        };
        match reply {
            Some(text) => self.reply(chat_id, &text).await,
            None => self.reply(chat_id, messages::NO_RESULTS).await,
        }
    }

    async fn send_stats(&self, chat_id: i64, session: &Mutex<UserSession>) {
        let snapshot = session.lock().await.clone();
        let (running, cached_results) = {
            let campaign = self.campaign.lock().await;
            (campaign.running, campaign.results.len())
        };
        let proxies_path = if snapshot.proxies_path.exists() {
            &snapshot.proxies_path
        } else {
            &self.settings.shared_proxies
        };
        let stats = messages::Stats {
            running,
            identities: read_identities(&snapshot.identities_path).map_or(0, |v| v.len()),
            targets: read_targets(&snapshot.targets_path).map_or(0, |v| v.len()),
            proxies: read_proxies(proxies_path).map_or(0, |v| v.len()),
            concurrency: snapshot.concurrency,
            cached_results,
            sessions: self.sessions.len().await,
            chat_id,
        };
        self.reply(chat_id, &messages::stats(&stats)).await;
    }
}
