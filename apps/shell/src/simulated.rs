//! Test-mode provider: synthesizes the full interstitial lifecycle locally
//! so the shell can run without the vendor SDK linked in.

use std::time::Duration;

use ad_integration::{
    CompletionState, HostSurface, InitOutcome, InterstitialProvider, LoadOutcome, ShowEvent,
};
use async_trait::async_trait;
use tokio::{sync::broadcast, time::sleep};

const DEFAULT_STAGE_LATENCY: Duration = Duration::from_millis(150);

pub struct SimulatedInterstitialProvider {
    stage_latency: Duration,
}

impl SimulatedInterstitialProvider {
    pub fn new() -> Self {
        Self {
            stage_latency: DEFAULT_STAGE_LATENCY,
        }
    }
}

impl Default for SimulatedInterstitialProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InterstitialProvider for SimulatedInterstitialProvider {
    async fn initialize(&self, _app_id: &str, _test_mode: bool) -> InitOutcome {
        sleep(self.stage_latency).await;
        InitOutcome::Complete
    }

    async fn load(&self, placement_id: &str) -> LoadOutcome {
        sleep(self.stage_latency).await;
        LoadOutcome::Loaded {
            placement_id: placement_id.to_string(),
        }
    }

    async fn show(
        &self,
        _host: &dyn HostSurface,
        placement_id: &str,
    ) -> broadcast::Receiver<ShowEvent> {
        let (tx, rx) = broadcast::channel(8);
        let placement_id = placement_id.to_string();
        let latency = self.stage_latency;
        tokio::spawn(async move {
            let _ = tx.send(ShowEvent::Started {
                placement_id: placement_id.clone(),
            });
            sleep(latency).await;
            let _ = tx.send(ShowEvent::Completed {
                placement_id,
                state: CompletionState::Completed,
            });
        });
        rx
    }
}
