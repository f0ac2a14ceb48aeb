//! Lifecycle controller: drives one audio file through upload, submission
//! and polling, and publishes the resulting state to observers.
//!
//! Every attempt is stamped with a generation number. `reset()` and
//! `select_asset()` bump the generation and cancel the attempt's token, so a
//! late upload/poll/completion of an abandoned attempt can no longer touch
//! the state.

pub mod events;
pub mod state;

pub use events::{ProgressEvent, ProgressEvents};
pub use state::{ControllerState, Phase, ProgressSnapshot};

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::asset::AudioAsset;
use crate::config::Config;
use crate::error::TranscriptionError;
use crate::transcription::{
    await_completion, AssemblyAiClient, PollOptions, TranscriptResult, TranscriptionRequestConfig,
    TranscriptionSettings, TranscriptionTransport, UploadObserver,
};
use state::next_processing_placeholder;

struct Attempt {
    generation: u64,
    cancel: CancellationToken,
}

/// State shared with upload callbacks, which must be `'static`.
struct Shared {
    attempt: Mutex<Attempt>,
    state: watch::Sender<ControllerState>,
}

impl Shared {
    /// Apply `f` only if `generation` is still the live attempt.
    fn update(&self, generation: u64, f: impl FnOnce(&mut ControllerState)) -> bool {
        self.update_if(generation, |state| {
            f(state);
            true
        })
    }

    /// Like `update`, but observers are only notified when `f` returns true.
    fn update_if(&self, generation: u64, f: impl FnOnce(&mut ControllerState) -> bool) -> bool {
        let attempt = self.attempt.lock();
        if attempt.generation != generation {
            return false;
        }
        self.state.send_if_modified(f);
        true
    }

    /// Invalidate whatever attempt is running and apply `f` unconditionally.
    fn abandon(&self, f: impl FnOnce(&mut ControllerState)) {
        let mut attempt = self.attempt.lock();
        attempt.generation += 1;
        attempt.cancel.cancel();
        attempt.cancel = CancellationToken::new();
        self.state.send_modify(|state| {
            let attempts = state.attempts;
            f(state);
            state.attempts = attempts;
        });
    }
}

/// Cheap to clone; clones drive and observe the same state.
#[derive(Clone)]
pub struct TranscriptionController {
    transport: Arc<dyn TranscriptionTransport>,
    poll: PollOptions,
    shared: Arc<Shared>,
}

impl TranscriptionController {
    pub fn new(transport: Arc<dyn TranscriptionTransport>, poll: PollOptions) -> Self {
        let (state, _) = watch::channel(ControllerState::default());
        Self {
            transport,
            poll,
            shared: Arc::new(Shared {
                attempt: Mutex::new(Attempt {
                    generation: 0,
                    cancel: CancellationToken::new(),
                }),
                state,
            }),
        }
    }

    /// Controller talking to the hosted service with the configured credential.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(AssemblyAiClient::from_config(config)), config.poll)
    }

    pub fn state(&self) -> ControllerState {
        self.shared.state.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.shared.state.borrow().phase
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.shared.state.borrow().progress
    }

    pub fn overall_progress(&self) -> f64 {
        self.shared.state.borrow().overall_progress()
    }

    pub fn result(&self) -> Option<TranscriptResult> {
        self.shared.state.borrow().result.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state.borrow().error.clone()
    }

    pub fn asset(&self) -> Option<Arc<AudioAsset>> {
        self.shared.state.borrow().asset.clone()
    }

    /// Latest state, pushed on every change
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.shared.state.subscribe()
    }

    pub fn progress_events(&self) -> ProgressEvents {
        ProgressEvents::new(self.subscribe())
    }

    /// Replace the selected file, abandoning any running attempt.
    pub fn select_asset(&self, asset: Option<AudioAsset>) {
        match &asset {
            Some(a) => info!("Selected {} ({} bytes)", a.name(), a.size()),
            None => info!("Cleared asset selection"),
        }
        let asset = asset.map(Arc::new);
        self.shared.abandon(move |state| {
            state.clear_attempt();
            state.asset = asset;
        });
    }

    /// Back to the initial state. A running attempt can no longer change anything.
    pub fn reset(&self) {
        info!("Resetting transcription state");
        self.shared.abandon(|state| *state = ControllerState::default());
    }

    /// Run one attempt for the selected asset.
    ///
    /// Does nothing without an asset, or while another attempt is running.
    /// Failures end up in the observable state, not in a return value.
    pub async fn start(&self, settings: TranscriptionSettings) {
        let Some((generation, cancel, asset)) = self.begin_attempt() else {
            return;
        };

        match self.run_attempt(generation, &cancel, &asset, &settings).await {
            Ok(result) => {
                let applied = self.shared.update(generation, |state| {
                    state.progress.processing = 100.0;
                    state.set_phase(Phase::Completed);
                    state.result = Some(result);
                });
                if applied {
                    info!("Transcription of {} completed", asset.name());
                }
            }
            Err(TranscriptionError::Cancelled) => {
                info!("Transcription of {} abandoned", asset.name());
            }
            Err(e) => {
                error!("Transcription of {} failed: {}", asset.name(), e);
                self.shared.update(generation, |state| {
                    state.error = Some(e.to_string());
                    state.set_phase(Phase::Error);
                });
            }
        }
    }

    fn begin_attempt(&self) -> Option<(u64, CancellationToken, Arc<AudioAsset>)> {
        let mut attempt = self.shared.attempt.lock();
        let (asset, phase) = {
            let state = self.shared.state.borrow();
            (state.asset.clone(), state.phase)
        };

        let Some(asset) = asset else {
            debug!("start() without a selected asset, ignoring");
            return None;
        };
        if phase.is_active() {
            warn!("start() while {}, ignoring", phase);
            return None;
        }

        attempt.generation += 1;
        attempt.cancel = CancellationToken::new();
        self.shared.state.send_modify(|state| {
            state.clear_attempt();
            state.attempts += 1;
            state.set_phase(Phase::Uploading);
        });

        Some((attempt.generation, attempt.cancel.clone(), asset))
    }

    async fn run_attempt(
        &self,
        generation: u64,
        cancel: &CancellationToken,
        asset: &AudioAsset,
        settings: &TranscriptionSettings,
    ) -> Result<TranscriptResult, TranscriptionError> {
        let observer = self.upload_observer(generation);
        let upload_url = tokio::select! {
            _ = cancel.cancelled() => return Err(TranscriptionError::Cancelled),
            url = self.transport.upload(asset, Some(observer)) => url?,
        };

        let config = TranscriptionRequestConfig::from_settings(upload_url, settings);
        let job_id = tokio::select! {
            _ = cancel.cancelled() => return Err(TranscriptionError::Cancelled),
            id = self.transport.submit(&config) => id?,
        };

        let entered = self.shared.update(generation, |state| {
            state.progress.upload = 100.0;
            state.progress.processing = 0.0;
            state.set_phase(Phase::Processing);
        });
        if !entered {
            return Err(TranscriptionError::Cancelled);
        }

        let snapshot = await_completion(self.transport.as_ref(), &job_id, &self.poll, cancel, |snapshot| {
            if snapshot.status.is_terminal() {
                return;
            }
            self.shared.update(generation, |state| {
                state.progress.processing = next_processing_placeholder(state.progress.processing);
            });
        })
        .await?;

        Ok(TranscriptResult::from_snapshot(&snapshot))
    }

    fn upload_observer(&self, generation: u64) -> UploadObserver {
        let shared = Arc::clone(&self.shared);
        Arc::new(move |percent: f64| {
            shared.update_if(generation, |state| {
                // Late calls after the upload step must not move the phase back
                if state.phase != Phase::Uploading {
                    return false;
                }
                state.progress.upload = state.progress.upload.max(percent.clamp(0.0, 100.0));
                true
            });
        })
    }
}
