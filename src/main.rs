//! Headless photo-booth kiosk loop: live view acquisition plus pose guidance.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use photobooth_core::{
    config::Config,
    frame::Frame,
    frame_source::FrameSource,
    guidance::{Badges, GuidanceEngine, InputSource},
};
use std::{
    cell::RefCell,
    path::PathBuf,
    rc::Rc,
    time::{Duration, Instant},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Directory watched for the sentinel image
    #[arg(long)]
    drop_dir: Option<PathBuf>,

    /// Fix the yaw calibration source (sdk, file) instead of following the frames
    #[arg(short, long)]
    source: Option<InputSource>,

    /// Run for this many seconds (0 runs until killed)
    #[arg(long, default_value = "30")]
    seconds: u64,

    /// Aspect ratio hint passed to the guidance engine
    #[arg(long, default_value = "3:4")]
    ratio: String,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(dir) = &args.drop_dir {
        config.liveview.drop_dir.clone_from(dir);
    }
    if let Some(source) = args.source {
        config.guidance.input_source = source;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let config = load_config(&args)?;
    if args.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    info!("Photo booth core starting, sentinel {}", config.liveview.sentinel_path().display());

    let mut engine = GuidanceEngine::new(&config.guidance)?;
    let mut source = FrameSource::without_camera(config.liveview.clone());
    source.set_status_listener(|mode| info!("Live view status: {}", mode));

    let latest: Rc<RefCell<Option<Frame>>> = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&latest);
    let streaming = source.start(move |frame| {
        *slot.borrow_mut() = Some(frame);
    });
    info!("Live view from {}", if streaming { "camera" } else { "sentinel file" });

    let started = Instant::now();
    let run_for = (args.seconds > 0).then(|| Duration::from_secs(args.seconds));
    let mut last_badges = Badges::default();

    while run_for.map_or(true, |limit| started.elapsed() < limit) {
        source.dispatch_timeout(Duration::from_millis(50));
        let Some(frame) = latest.borrow_mut().take() else {
            continue;
        };

        if args.source.is_none() {
            engine.set_input_source(frame.origin().into());
        }
        let timestamp_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let out = engine.update(&frame, &args.ratio, timestamp_ms, None, None);

        if out.badges != last_badges {
            info!(
                "Guidance: {} | left: {} | right: {}",
                out.badges.primary, out.badges.left, out.badges.right
            );
            last_badges = out.badges;
        }
    }

    source.stop();
    info!("Photo booth core finished after {:.1}s", started.elapsed().as_secs_f64());
    Ok(())
}
