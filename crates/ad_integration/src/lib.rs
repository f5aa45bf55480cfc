//! Integration seam for the external interstitial-ad provider SDK.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    Completed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitOutcome {
    Complete,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded {
        placement_id: String,
    },
    Failed {
        placement_id: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowEvent {
    Started {
        placement_id: String,
    },
    Clicked {
        placement_id: String,
    },
    Completed {
        placement_id: String,
        state: CompletionState,
    },
    Failed {
        placement_id: String,
        reason: String,
    },
}

/// The UI surface the provider renders a full-screen interstitial into,
/// supplied by the hosting container.
pub trait HostSurface: Send + Sync {
    fn surface_id(&self) -> &str;
}

#[async_trait]
pub trait InterstitialProvider: Send + Sync {
    async fn initialize(&self, app_id: &str, test_mode: bool) -> InitOutcome;
    async fn load(&self, placement_id: &str) -> LoadOutcome;
    /// Show events arrive on the returned stream until the provider drops
    /// its sender; a show failure is an event on the stream, not an `Err`.
    async fn show(
        &self,
        host: &dyn HostSurface,
        placement_id: &str,
    ) -> broadcast::Receiver<ShowEvent>;
}

pub struct MissingInterstitialProvider;

#[async_trait]
impl InterstitialProvider for MissingInterstitialProvider {
    async fn initialize(&self, _app_id: &str, _test_mode: bool) -> InitOutcome {
        InitOutcome::Failed {
            reason: "ad provider sdk is not linked into this build".to_string(),
        }
    }

    async fn load(&self, placement_id: &str) -> LoadOutcome {
        LoadOutcome::Failed {
            placement_id: placement_id.to_string(),
            reason: "ad provider sdk is not linked into this build".to_string(),
        }
    }

    async fn show(
        &self,
        _host: &dyn HostSurface,
        _placement_id: &str,
    ) -> broadcast::Receiver<ShowEvent> {
        let (tx, rx) = broadcast::channel(1);
        drop(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoSurface;

    impl HostSurface for NoSurface {
        fn surface_id(&self) -> &str {
            "none"
        }
    }

    #[tokio::test]
    async fn missing_provider_fails_every_stage() {
        let provider = MissingInterstitialProvider;

        let init = provider.initialize("app", false).await;
        assert!(matches!(init, InitOutcome::Failed { .. }));

        let load = provider.load("slot").await;
        match load {
            LoadOutcome::Failed { placement_id, .. } => assert_eq!(placement_id, "slot"),
            other => panic!("expected load failure, got {other:?}"),
        }

        let mut stream = provider.show(&NoSurface, "slot").await;
        assert!(matches!(
            stream.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[test]
    fn show_events_serialize_snake_case() {
        let event = ShowEvent::Completed {
            placement_id: "Interstitial_Android".to_string(),
            state: CompletionState::Completed,
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"completed\""));
        assert!(json.contains("\"placement_id\":\"Interstitial_Android\""));
    }
}
