use std::sync::Arc;

use ad_integration::{HostSurface, InterstitialProvider, MissingInterstitialProvider};
use ad_session::{AdLifecycleController, AdSessionConfig};
use clap::Parser;
use tracing::info;

mod config;
mod simulated;

use config::{apply_cli_overrides, load_settings, CliOverrides};
use simulated::SimulatedInterstitialProvider;

#[derive(Debug, Parser)]
#[command(
    name = "shell",
    about = "App shell that loads and shows one interstitial ad on startup"
)]
struct Cli {
    #[arg(long)]
    app_id: Option<String>,
    #[arg(long)]
    placement_id: Option<String>,
    #[arg(long)]
    test_mode: Option<bool>,
}

struct BridgeHost {
    surface_id: String,
}

impl HostSurface for BridgeHost {
    fn surface_id(&self) -> &str {
        &self.surface_id
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    apply_cli_overrides(
        &mut settings,
        CliOverrides {
            app_id: cli.app_id,
            placement_id: cli.placement_id,
            test_mode: cli.test_mode,
        },
    );

    let config = AdSessionConfig::new(
        settings.provider_app_id,
        settings.placement_id,
        settings.test_mode,
    )?;

    // Without the vendor SDK in the build, only test mode can complete the
    // lifecycle; otherwise initialization fails and is logged as terminal.
    let provider: Arc<dyn InterstitialProvider> = if config.test_mode() {
        Arc::new(SimulatedInterstitialProvider::new())
    } else {
        Arc::new(MissingInterstitialProvider)
    };
    let host = Arc::new(BridgeHost {
        surface_id: "main-activity".to_string(),
    });

    info!(
        app_id = config.provider_app_id(),
        placement = config.placement_id(),
        test_mode = config.test_mode(),
        "starting ad session"
    );

    let mut controller = AdLifecycleController::new(config, provider, host);
    controller.run().await;

    info!(state = ?controller.state(), "ad session finished");
    Ok(())
}
