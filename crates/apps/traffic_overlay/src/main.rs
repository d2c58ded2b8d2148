mod script;
mod sources;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use catalog::{parse_feed, Camera, FeedError, FeedOptions, StatusMap};
use clap::Parser;
use foundation::math::{LatLng, Vec2};
use foundation::Viewport;
use overlay::{OverlayConfig, OverlayEngine, RenderRecord};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::script::PanScript;
use crate::sources::{load_text, FetchCompletion, ImageSource};

const DEFAULT_FEED_URL: &str = "https://data.austintexas.gov/resource/b4k4-adkb.json";
const DEFAULT_IMAGE_URL: &str = "https://cctv.austinmobility.io/image/{camera_id}.jpg";

#[derive(Parser, Debug)]
#[command(author, version, about = "Traffic camera overlay driver")]
struct Args {
    /// Camera feed: URL or local JSON file (env: TRAFFIC_FEED)
    #[arg(long)]
    feed: Option<String>,

    /// Camera status list: URL or local JSON file
    #[arg(long)]
    statuses: Option<String>,

    /// Overlay config JSON; missing keys use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image URL template containing `{camera_id}` (env: TRAFFIC_IMAGE_URL)
    #[arg(long)]
    image_url: Option<String>,

    #[arg(long, default_value_t = 30.2672)]
    lat: f64,

    #[arg(long, default_value_t = -97.7431, allow_hyphen_values = true)]
    lng: f64,

    #[arg(long, default_value_t = 15.0)]
    zoom: f64,

    /// Map container size in pixels, WIDTHxHEIGHT
    #[arg(long, default_value = "1280x800")]
    size: String,

    /// Pan velocity in pixels per second, DXxDY
    #[arg(long, default_value = "0x0", allow_hyphen_values = true)]
    pan: String,

    /// Radius of the scripted pointer orbit in pixels (0 disables it)
    #[arg(long, default_value_t = 0.0)]
    pointer_orbit: f64,

    /// Stop after this many seconds
    #[arg(long, default_value_t = 30.0)]
    duration_s: f64,

    /// Keep cameras the feed reports as switched off
    #[arg(long)]
    all_cameras: bool,

    /// Print render records as JSON lines on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        error!("traffic overlay failed: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => OverlayConfig::load(path)?,
        None => OverlayConfig::default(),
    };
    config.max_active = env_var_usize("TRAFFIC_MAX_ACTIVE", config.max_active);
    config.tick_hz = env_var_f64("TRAFFIC_TICK_HZ", config.tick_hz);
    config.validate()?;

    let client = reqwest::Client::new();
    let feed_source = args.feed.clone().unwrap_or_else(|| {
        env::var("TRAFFIC_FEED").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string())
    });
    let image_url = args.image_url.clone().unwrap_or_else(|| {
        env::var("TRAFFIC_IMAGE_URL").unwrap_or_else(|_| DEFAULT_IMAGE_URL.to_string())
    });
    let images = ImageSource::new(
        image_url,
        client.clone(),
        Duration::from_millis(env_var_u64("TRAFFIC_FETCH_TIMEOUT_MS", 5_000)),
    );

    let feed_options = FeedOptions {
        only_turned_on: !args.all_cameras,
        ..FeedOptions::default()
    };
    let cameras = load_cameras(&client, &feed_source, feed_options).await?;
    info!(cameras = cameras.len(), source = %feed_source, "camera feed loaded");

    let size = parse_pair(&args.size).ok_or("--size must look like 1280x800")?;
    let pan = parse_pair(&args.pan).ok_or("--pan must look like 120x0")?;
    let mut viewport =
        Viewport::from_center_zoom(LatLng::new(args.lat, args.lng), args.zoom, size);

    let tick_hz = config.tick_hz;
    let mut engine: OverlayEngine<Bytes> = OverlayEngine::new(config)?;
    let (tx, mut rx) = mpsc::channel::<FetchCompletion>(256);

    engine.set_cameras(cameras);
    if let Some(source) = &args.statuses {
        let statuses = StatusMap::from_json(&load_text(&client, source).await?)?;
        info!(entries = statuses.len(), "camera statuses loaded");
        engine.apply_statuses(&statuses);
    }
    images.spawn_all(engine.on_viewport_change(viewport), &tx);

    let (feed_tx, mut feed_rx) = mpsc::channel::<Vec<Camera>>(1);
    let refresh_s = env_var_u64("TRAFFIC_FEED_REFRESH_S", 0);
    if refresh_s > 0 {
        spawn_feed_refresh(
            client.clone(),
            feed_source.clone(),
            feed_options,
            refresh_s,
            feed_tx,
        );
    } else {
        drop(feed_tx);
    }

    let notify_every = env_var_u64("TRAFFIC_PAN_NOTIFY_TICKS", 6);
    let mut script =
        PanScript::new(pan, notify_every).with_pointer_orbit(args.pointer_orbit, 8.0);
    let metrics_every = (env_var_f64("TRAFFIC_METRICS_EVERY_S", 5.0) * tick_hz).max(1.0) as u64;
    let total_ticks = (args.duration_s * tick_hz).max(0.0) as u64;
    let dt_s = 1.0 / tick_hz;

    let mut interval = tokio::time::interval(Duration::from_secs_f64(dt_s));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut tick: u64 = 0;
    while tick < total_ticks {
        tokio::select! {
            _ = interval.tick() => {
                tick += 1;
                if script.step(&mut viewport, tick, dt_s) {
                    images.spawn_all(engine.on_viewport_change(viewport), &tx);
                }
                engine.on_pointer_move(script.pointer(&viewport, tick as f64 * dt_s));

                let records = engine.tick();
                if args.json {
                    println!("{}", records_json(engine.frame().index, &records));
                }
                if tick % metrics_every == 0 {
                    log_progress(&engine, &records);
                }
            }
            Some((ticket, result)) = rx.recv() => {
                engine.on_fetch_complete(ticket, result);
            }
            Some(snapshot) = feed_rx.recv() => {
                info!(cameras = snapshot.len(), "camera feed refreshed");
                images.spawn_all(engine.set_cameras(snapshot), &tx);
            }
        }
    }

    engine.metrics().log_snapshot();
    info!(ticks = tick, "traffic overlay finished");
    Ok(())
}

async fn load_cameras(
    client: &reqwest::Client,
    source: &str,
    options: FeedOptions,
) -> Result<Vec<Camera>, FeedError> {
    let json = load_text(client, source).await?;
    parse_feed(&json, options)
}

fn spawn_feed_refresh(
    client: reqwest::Client,
    source: String,
    options: FeedOptions,
    every_s: u64,
    tx: mpsc::Sender<Vec<Camera>>,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(every_s));
        interval.tick().await;
        loop {
            interval.tick().await;
            match load_cameras(&client, &source, options).await {
                Ok(cameras) => {
                    if tx.send(cameras).await.is_err() {
                        return;
                    }
                }
                Err(err) => warn!("camera feed refresh failed: {err}"),
            }
        }
    });
}

fn log_progress(engine: &OverlayEngine<Bytes>, records: &[RenderRecord]) {
    let ready = records.iter().filter(|r| r.is_ready()).count();
    let strained = records.iter().filter(|r| r.strained).count();
    let center = engine.viewport().map(|v| v.center);
    info!(
        frame = engine.frame().index,
        drawn = records.len(),
        ready,
        strained,
        in_flight = engine.active().in_flight_count(),
        settled = engine.simulation().is_idle(),
        lat = center.map(|c| c.lat).unwrap_or(f64::NAN),
        lng = center.map(|c| c.lng).unwrap_or(f64::NAN),
        "overlay progress"
    );
    engine.metrics().log_snapshot();
}

fn records_json(frame: u64, records: &[RenderRecord]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            json!({
                "camera_id": r.camera_id.as_str(),
                "x": r.x,
                "y": r.y,
                "scale": r.scale,
                "width": r.width,
                "height": r.height,
                "image": match r.image {
                    admission::ImageState::Loading => "loading",
                    admission::ImageState::Ready => "ready",
                },
                "strained": r.strained,
            })
        })
        .collect();
    json!({ "frame": frame, "records": items })
}

/// Parses `"AxB"` into a vector.
fn parse_pair(s: &str) -> Option<Vec2> {
    let (a, b) = s.split_once(['x', 'X'])?;
    let x: f64 = a.trim().parse().ok()?;
    let y: f64 = b.trim().parse().ok()?;
    (x.is_finite() && y.is_finite()).then(|| Vec2::new(x, y))
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
