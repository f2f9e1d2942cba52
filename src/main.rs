use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

use posture_score::alert::{AlertState, CommandNotifier, LogNotifier, NotificationSink};
use posture_score::config::Config;
use posture_score::replay::{FrameReader, PostureSample, SampleWriter};
use posture_score::session::PostureSession;

/// Replay recorded pose landmarks through the posture scorer
#[derive(Parser, Debug)]
#[command(name = "posture_replay", version = env!("POSTURE_VERSION"))]
struct Args {
    /// JSON Lines file, one landmark frame per line
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    #[arg(long, value_name = "PATH", default_value = "config.toml")]
    config: PathBuf,
    /// Write per-frame samples as JSON Lines
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(long)]
    threshold: Option<u8>,
    #[arg(long, value_name = "MS")]
    sustained_ms: Option<u64>,
    /// Desktop notification command, e.g. "notify-send -u normal"
    #[arg(long, value_name = "CMD")]
    notify_command: Option<String>,
}

#[derive(Default)]
struct Summary {
    frames: u64,
    score_sum: u64,
    slouch_frames: u64,
    alerts: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let args = Args::parse();
    run(args)
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load_or_default(&args.config)?;
    if let Some(threshold) = args.threshold {
        config.alert.threshold = threshold;
    }
    if let Some(ms) = args.sustained_ms {
        config.alert.sustained_ms = ms;
    }
    if let Some(cmd) = &args.notify_command {
        config.notify.command = cmd.split_whitespace().map(str::to_string).collect();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    info!("Input: {}", args.input.display());
    info!(
        "Alert: threshold={}, sustained={}ms, enabled={}",
        config.alert.threshold, config.alert.sustained_ms, config.alert.enabled
    );
    info!("Smoothing: {} frames", config.smoothing.history_capacity);

    let mut session = PostureSession::from_config(&config);
    if config.notify.enabled {
        let notifier: Box<dyn NotificationSink + Send> = match CommandNotifier::from_config(&config.notify) {
            Some(cmd) => Box::new(cmd),
            None => Box::new(LogNotifier),
        };
        session = session.with_notifier(notifier);
    }

    let mut writer = match &args.output {
        Some(path) => Some(SampleWriter::create(path)?),
        None => None,
    };

    let reader = FrameReader::open(&args.input)?;
    let base = Instant::now();
    let mut summary = Summary::default();

    for frame in reader {
        let frame = frame?;
        let now = base + Duration::from_millis(frame.timestamp_ms);
        let Some(report) = session.on_frame(&frame.landmarks, frame.width, frame.height, now) else {
            continue;
        };

        summary.frames += 1;
        summary.score_sum += report.score as u64;
        if report.slouch {
            summary.slouch_frames += 1;
        }
        if report.alert_changed {
            info!(
                "[{:>8}ms] alert -> {} (score {})",
                frame.timestamp_ms,
                report.alert.as_str(),
                report.score
            );
            if report.alert == AlertState::Active {
                summary.alerts += 1;
            }
        }
        if let Some(fps) = report.fps {
            info!(
                "[{:>8}ms] FPS: {} | score {} ({})",
                frame.timestamp_ms,
                fps,
                report.score,
                report.status.label()
            );
        }

        if let Some(w) = writer.as_mut() {
            w.write(&PostureSample::from_report(frame.timestamp_ms, &report))?;
        }
    }

    session.stop();
    if let Some(w) = writer.as_mut() {
        w.flush()?;
    }

    if summary.frames == 0 {
        info!("No frames in {}", args.input.display());
        return Ok(());
    }
    info!(
        "Frames: {}, mean score: {:.1}, slouching: {:.1}%, alerts: {}",
        summary.frames,
        summary.score_sum as f64 / summary.frames as f64,
        summary.slouch_frames as f64 * 100.0 / summary.frames as f64,
        summary.alerts
    );
    Ok(())
}
