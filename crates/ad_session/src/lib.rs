//! Ad lifecycle sequencing: initialize, then load, then show, driven by
//! asynchronous provider outcomes. Every failure is terminal and report-only.

use std::sync::Arc;

use ad_integration::{
    CompletionState, HostSurface, InitOutcome, InterstitialProvider, LoadOutcome, ShowEvent,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("provider app id must not be empty")]
    EmptyProviderAppId,
    #[error("placement id must not be empty")]
    EmptyPlacementId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdSessionConfig {
    provider_app_id: String,
    placement_id: String,
    test_mode: bool,
}

impl AdSessionConfig {
    pub fn new(
        provider_app_id: impl Into<String>,
        placement_id: impl Into<String>,
        test_mode: bool,
    ) -> Result<Self, ConfigError> {
        let provider_app_id = provider_app_id.into();
        let placement_id = placement_id.into();

        if provider_app_id.trim().is_empty() {
            return Err(ConfigError::EmptyProviderAppId);
        }
        if placement_id.trim().is_empty() {
            return Err(ConfigError::EmptyPlacementId);
        }

        Ok(Self {
            provider_app_id,
            placement_id,
            test_mode,
        })
    }

    pub fn provider_app_id(&self) -> &str {
        &self.provider_app_id
    }

    pub fn placement_id(&self) -> &str {
        &self.placement_id
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdLifecycleEvent {
    InitComplete,
    InitFailed {
        reason: String,
    },
    Loaded {
        placement_id: String,
    },
    LoadFailed {
        placement_id: String,
        reason: String,
    },
    ShowStarted {
        placement_id: String,
    },
    ShowClicked {
        placement_id: String,
    },
    ShowCompleted {
        placement_id: String,
        state: CompletionState,
    },
    ShowFailed {
        placement_id: String,
        reason: String,
    },
}

impl From<InitOutcome> for AdLifecycleEvent {
    fn from(outcome: InitOutcome) -> Self {
        match outcome {
            InitOutcome::Complete => Self::InitComplete,
            InitOutcome::Failed { reason } => Self::InitFailed { reason },
        }
    }
}

impl From<LoadOutcome> for AdLifecycleEvent {
    fn from(outcome: LoadOutcome) -> Self {
        match outcome {
            LoadOutcome::Loaded { placement_id } => Self::Loaded { placement_id },
            LoadOutcome::Failed {
                placement_id,
                reason,
            } => Self::LoadFailed {
                placement_id,
                reason,
            },
        }
    }
}

impl From<ShowEvent> for AdLifecycleEvent {
    fn from(event: ShowEvent) -> Self {
        match event {
            ShowEvent::Started { placement_id } => Self::ShowStarted { placement_id },
            ShowEvent::Clicked { placement_id } => Self::ShowClicked { placement_id },
            ShowEvent::Completed {
                placement_id,
                state,
            } => Self::ShowCompleted {
                placement_id,
                state,
            },
            ShowEvent::Failed {
                placement_id,
                reason,
            } => Self::ShowFailed {
                placement_id,
                reason,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    Initializing,
    Loading,
    Showing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Initializing,
    Loading,
    Showing,
    Done,
    Failed { stage: SessionStage, reason: String },
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRequest {
    Initialize,
    Load { placement_id: String },
    Show { placement_id: String },
}

#[derive(Debug, Error)]
pub enum AdSessionError {
    #[error("ad provider initialization failed: {reason}")]
    Initialization { reason: String },
    #[error("ad load failed for placement '{placement_id}': {reason}")]
    Load {
        placement_id: String,
        reason: String,
    },
    #[error("ad show failed for placement '{placement_id}': {reason}")]
    Show {
        placement_id: String,
        reason: String,
    },
}

/// Owns the session-state enum and decides, per lifecycle event, the single
/// follow-up provider request (if any). Events that do not match the current
/// state are ignored, which makes replayed or stale callbacks harmless.
pub struct SessionReducer {
    config: AdSessionConfig,
    state: SessionState,
}

impl SessionReducer {
    pub fn new(config: AdSessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
        }
    }

    pub fn config(&self) -> &AdSessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn on_start(&mut self) -> Option<ProviderRequest> {
        if self.state != SessionState::Idle {
            return None;
        }
        self.state = SessionState::Initializing;
        Some(ProviderRequest::Initialize)
    }

    pub fn on_event(&mut self, event: &AdLifecycleEvent) -> Option<ProviderRequest> {
        match event {
            AdLifecycleEvent::InitComplete => {
                if self.state != SessionState::Initializing {
                    return None;
                }
                self.state = SessionState::Loading;
                Some(ProviderRequest::Load {
                    placement_id: self.config.placement_id().to_string(),
                })
            }
            AdLifecycleEvent::InitFailed { reason } => {
                if self.state != SessionState::Initializing {
                    return None;
                }
                self.state = SessionState::Failed {
                    stage: SessionStage::Initializing,
                    reason: reason.clone(),
                };
                None
            }
            AdLifecycleEvent::Loaded { placement_id } => {
                if self.state != SessionState::Loading {
                    return None;
                }
                self.state = SessionState::Showing;
                Some(ProviderRequest::Show {
                    placement_id: placement_id.clone(),
                })
            }
            AdLifecycleEvent::LoadFailed { reason, .. } => {
                if self.state != SessionState::Loading {
                    return None;
                }
                self.state = SessionState::Failed {
                    stage: SessionStage::Loading,
                    reason: reason.clone(),
                };
                None
            }
            AdLifecycleEvent::ShowStarted { .. } | AdLifecycleEvent::ShowClicked { .. } => None,
            AdLifecycleEvent::ShowCompleted { .. } => {
                if self.state != SessionState::Showing {
                    return None;
                }
                self.state = SessionState::Done;
                None
            }
            AdLifecycleEvent::ShowFailed { reason, .. } => {
                if self.state != SessionState::Showing {
                    return None;
                }
                self.state = SessionState::Failed {
                    stage: SessionStage::Showing,
                    reason: reason.clone(),
                };
                None
            }
        }
    }
}

/// Drives the reducer against the provider, one outstanding request at a
/// time, and forwards every lifecycle event to the log and to subscribers.
pub struct AdLifecycleController {
    provider: Arc<dyn InterstitialProvider>,
    host: Arc<dyn HostSurface>,
    reducer: SessionReducer,
    events: broadcast::Sender<AdLifecycleEvent>,
}

impl AdLifecycleController {
    pub fn new(
        config: AdSessionConfig,
        provider: Arc<dyn InterstitialProvider>,
        host: Arc<dyn HostSurface>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            provider,
            host,
            reducer: SessionReducer::new(config),
            events,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.reducer.state()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AdLifecycleEvent> {
        self.events.subscribe()
    }

    /// Runs the session to its terminal state. A second call observes that
    /// the session already left `Idle` and issues no provider request.
    pub async fn run(&mut self) {
        let Some(first) = self.reducer.on_start() else {
            warn!(state = ?self.reducer.state(), "ad session already started, ignoring");
            return;
        };

        let mut pending = Some(first);
        while let Some(request) = pending.take() {
            pending = self.execute(request).await;
        }
    }

    async fn execute(&mut self, request: ProviderRequest) -> Option<ProviderRequest> {
        match request {
            ProviderRequest::Initialize => {
                let app_id = self.reducer.config().provider_app_id().to_string();
                let test_mode = self.reducer.config().test_mode();
                info!(app_id = %app_id, test_mode, "initializing ad provider");
                let outcome = self.provider.initialize(&app_id, test_mode).await;
                self.deliver(outcome.into())
            }
            ProviderRequest::Load { placement_id } => {
                info!(placement = %placement_id, "loading interstitial");
                let outcome = self.provider.load(&placement_id).await;
                self.deliver(outcome.into())
            }
            ProviderRequest::Show { placement_id } => {
                info!(
                    placement = %placement_id,
                    surface = self.host.surface_id(),
                    "showing interstitial"
                );
                let mut stream = self.provider.show(self.host.as_ref(), &placement_id).await;
                loop {
                    match stream.recv().await {
                        Ok(show_event) => {
                            if let Some(follow_up) = self.deliver(show_event.into()) {
                                return Some(follow_up);
                            }
                            if self.reducer.state().is_terminal() {
                                return None;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "show event stream lagged");
                        }
                        // Provider dropped the stream; if no terminal show
                        // event arrived the session stays in Showing.
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        }
    }

    fn deliver(&mut self, event: AdLifecycleEvent) -> Option<ProviderRequest> {
        self.log_event(&event);
        let _ = self.events.send(event.clone());
        self.reducer.on_event(&event)
    }

    fn log_event(&self, event: &AdLifecycleEvent) {
        match event {
            AdLifecycleEvent::InitComplete => info!("ad provider initialized"),
            AdLifecycleEvent::InitFailed { reason } => {
                let err = AdSessionError::Initialization {
                    reason: reason.clone(),
                };
                warn!(error = %err, "ad session ended");
            }
            AdLifecycleEvent::Loaded { placement_id } => {
                info!(placement = %placement_id, "interstitial loaded");
            }
            AdLifecycleEvent::LoadFailed {
                placement_id,
                reason,
            } => {
                let err = AdSessionError::Load {
                    placement_id: placement_id.clone(),
                    reason: reason.clone(),
                };
                warn!(error = %err, "ad session ended");
            }
            AdLifecycleEvent::ShowStarted { placement_id } => {
                info!(placement = %placement_id, "interstitial show started");
            }
            AdLifecycleEvent::ShowClicked { placement_id } => {
                info!(placement = %placement_id, "interstitial clicked");
            }
            AdLifecycleEvent::ShowCompleted {
                placement_id,
                state,
            } => {
                info!(placement = %placement_id, state = ?state, "interstitial finished");
            }
            AdLifecycleEvent::ShowFailed {
                placement_id,
                reason,
            } => {
                let err = AdSessionError::Show {
                    placement_id: placement_id.clone(),
                    reason: reason.clone(),
                };
                warn!(error = %err, "ad session ended");
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
