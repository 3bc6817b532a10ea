use clap::Parser;
use orgmap::adapters::ip_locator::IpApiLocator;
use orgmap::adapters::render::ConsoleLayer;
use orgmap::adapters::sensor::{FixedSensor, NoSensor};
use orgmap::domain::model::ViewportBounds;
use orgmap::domain::ports::{ConfigProvider, LocationSensor, OrganizationStore, SensorOptions};
use orgmap::utils::error::{ErrorSeverity, MapError};
use orgmap::utils::{logger, validation::Validate};
use orgmap::{
    CategorySelection, CliConfig, HttpOrganizationStore, InMemoryStore, LocationDetector,
    LocationProvider, MapEvent, SyncSettings, ToastBoard, TomlConfig, ViewportSync,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting orgmap");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        exit_with(e);
    }
    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    let notifier = Arc::new(ToastBoard::new());
    let provider = LocationProvider::new();

    if config.location_enabled() {
        match cli.sensor_fix() {
            Some(fix) => detect_location(FixedSensor::new(fix), &config, &notifier, &provider).await?,
            None => detect_location(NoSensor, &config, &notifier, &provider).await?,
        }
    } else {
        tracing::info!("Location detection disabled, using default center");
    }

    if cli.offline {
        let store = InMemoryStore::bundled()?;
        tracing::info!("📦 Offline mode: {} bundled organizations", store.len());
        run_session(Arc::new(store), &config, notifier, provider).await
    } else {
        let store = HttpOrganizationStore::new(config.store_endpoint(), config.request_timeout())?;
        tracing::info!("🌐 Organization endpoint: {}", store.endpoint());
        run_session(Arc::new(store), &config, notifier, provider).await
    }
}

async fn detect_location<S: LocationSensor>(
    sensor: S,
    config: &TomlConfig,
    notifier: &Arc<ToastBoard>,
    provider: &LocationProvider,
) -> anyhow::Result<()> {
    let locator = IpApiLocator::new(config.ip_lookup_endpoint(), config.request_timeout())?;
    let detector = LocationDetector::new(sensor, locator, notifier.clone(), provider.clone())
        .with_options(SensorOptions {
            timeout: config.sensor_timeout(),
            ..Default::default()
        });

    if detector.detect().await.is_none() {
        tracing::info!("No location available, the map starts at the default center");
    }
    Ok(())
}

async fn run_session<S: OrganizationStore + 'static>(
    store: Arc<S>,
    config: &TomlConfig,
    notifier: Arc<ToastBoard>,
    provider: LocationProvider,
) -> anyhow::Result<()> {
    let settings = SyncSettings::from_config(config);
    let debounce = settings.debounce;
    let sync = ViewportSync::new(store, ConsoleLayer::new(), notifier, provider, settings);

    let (tx, rx) = mpsc::channel(64);
    let handle = tokio::spawn(sync.run(rx));

    println!("Commands: 'south,west,north,east' | move | categories A|B | recenter | fit | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }

        match parse_command(line) {
            Ok(events) => {
                for event in events {
                    if tx.send(event).await.is_err() {
                        anyhow::bail!("viewport sync stopped unexpectedly");
                    }
                }
            }
            Err(e) => eprintln!("❌ {}", e.user_friendly_message()),
        }
    }

    // 讓最後一次停止移動的請求有機會完成
    tokio::time::sleep(debounce + Duration::from_millis(500)).await;
    drop(tx);

    let sync = handle.await?;
    println!(
        "✅ {} organizations loaded, {} visible",
        sync.organizations().len(),
        sync.markers().len()
    );
    Ok(())
}

fn parse_command(line: &str) -> Result<Vec<MapEvent>, MapError> {
    if line == "move" {
        return Ok(vec![MapEvent::MovementStart]);
    }
    if line == "recenter" {
        return Ok(vec![MapEvent::Recenter]);
    }
    if line == "fit" {
        return Ok(vec![MapEvent::FitToMarkers]);
    }
    if let Some(rest) = line.strip_prefix("categories") {
        let selection = CategorySelection::parse_list(rest.trim())?;
        return Ok(vec![MapEvent::CategoriesChanged(selection)]);
    }

    // 一行座標視為一次完整的平移
    let bounds: ViewportBounds = line.parse()?;
    Ok(vec![MapEvent::MovementStart, MapEvent::Settled(bounds)])
}

fn exit_with(e: MapError) -> ! {
    tracing::error!(
        "❌ orgmap failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
