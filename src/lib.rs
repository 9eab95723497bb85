pub mod random;
pub mod render;
pub mod segments;
pub mod selection;
pub mod settings;
pub mod utils;
pub mod wheel;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::sync::{mpsc, Mutex};

use random::Seed;
use segments::Segment;
use settings::{SettingsStore, WheelSettings};
use wheel::{FrameDriver, IntervalScheduler, StartOutcome, WheelController, WheelEvent};

pub use random::RandomSource;
pub use segments::{Sector, SectorSet};
pub use wheel::{ResetAngle, SpinPhase, Winner};

#[derive(Parser, Debug)]
#[command(name = "prize-wheel", about = "Spin a weighted prize wheel headlessly")]
struct Cli {
    /// JSON file holding an array of `{ id, label, weight?, color? }`
    #[arg(long)]
    segments: Option<PathBuf>,
    /// Seed for a reproducible pick (string or number)
    #[arg(long, env = "WHEEL_SEED")]
    seed: Option<String>,
    /// Segment id decided elsewhere that the wheel must land on
    #[arg(long)]
    winner: Option<String>,
    /// Settings file; created on first update, defaults when missing
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Write the landed wheel as SVG
    #[arg(long)]
    svg: Option<PathBuf>,
}

fn demo_segments() -> Vec<Segment> {
    vec![
        Segment::new("1", "Gift Card", 2.0),
        Segment::new("2", "Headphones", 1.5),
        Segment::new("3", "Sticker Pack", 1.0),
        Segment::new("4", "T-Shirt", 1.0),
        Segment::new("5", "Coffee Mug", 1.0),
    ]
}

fn load_segments(path: Option<&PathBuf>) -> Result<Vec<Segment>> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read segments from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse segments in {}", path.display()))
        }
        None => Ok(demo_segments()),
    }
}

async fn spin_once(cli: Cli) -> Result<Winner> {
    let settings = match cli.settings.as_ref() {
        Some(path) => SettingsStore::new(path.clone())?.settings()?,
        None => WheelSettings::default(),
    };
    let segments = load_segments(cli.segments.as_ref())?;

    let (tx, mut rx) = mpsc::unbounded_channel::<WheelEvent>();
    let mut controller = WheelController::new(settings.spin.clone(), IntervalScheduler::new(), tx);
    controller.set_segments(segments);
    // "42" and 42 hash identically, so the text form is enough.
    controller.set_seed(cli.seed.map(Seed::Text));
    controller.set_winner_id(cli.winner);
    let wheel = Arc::new(Mutex::new(controller));

    let mut driver = FrameDriver::default();
    driver.start(wheel.clone())?;

    let outcome = wheel.lock().await.start();
    match outcome {
        StartOutcome::Started { .. } => {}
        StartOutcome::UnresolvedWinner { requested } => {
            driver.stop().await?;
            return Err(anyhow!("winner id {requested:?} matches no segment"));
        }
        other => {
            driver.stop().await?;
            return Err(anyhow!("wheel could not spin: {other:?}"));
        }
    }

    let winner = loop {
        match rx.recv().await {
            Some(WheelEvent::SpinEnded { winner, .. }) => break winner,
            Some(WheelEvent::SpinStarted { target_angle, .. }) => {
                log::info!("spinning towards {target_angle:.2}°");
            }
            None => {
                driver.stop().await?;
                return Err(anyhow!("wheel dropped before landing"));
            }
        }
    };
    driver.stop().await?;

    if let Some(path) = cli.svg.as_ref() {
        let guard = wheel.lock().await;
        let svg = render::render_svg(
            guard.segments(),
            guard.sectors(),
            guard.current_angle(),
            &settings.render,
        );
        std::fs::write(path, svg)
            .with_context(|| format!("Failed to write SVG to {}", path.display()))?;
        log::info!("wrote {}", path.display());
    }

    Ok(winner)
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let winner = runtime.block_on(spin_once(cli))?;
    println!("{}", serde_json::to_string(&winner)?);
    Ok(())
}
