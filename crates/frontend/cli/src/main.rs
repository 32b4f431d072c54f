use anyhow::{Context, Result};
use clap::Parser;
use emu_arcade::profile::{self, GameProfile};
use emu_arcade::ArcadeSystem;
use emu_core::logging::{LogCategory, LogConfig, LogLevel};
use emu_core::System;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Headless runner for twin-lane arcade boards")]
struct Args {
    /// Built-in title (see --list)
    title: Option<String>,

    /// Load the board profile from a JSON file instead of a built-in title
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Lane A program ROM
    #[arg(long)]
    rom_a: Option<PathBuf>,

    /// Lane B program ROM
    #[arg(long)]
    rom_b: Option<PathBuf>,

    /// Sound lane program ROM
    #[arg(long)]
    rom_sound: Option<PathBuf>,

    /// Number of frames to run
    #[arg(long, default_value_t = 5)]
    frames: u32,

    /// List built-in titles and exit
    #[arg(long, default_value_t = false)]
    list: bool,

    /// Print the selected profile as JSON and exit
    #[arg(long, default_value_t = false)]
    dump_profile: bool,

    /// Board log level for all categories (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "off")]
    log_level: String,

    /// Per-category override, e.g. `--log latch=debug` (repeatable)
    #[arg(long = "log", value_name = "CATEGORY=LEVEL")]
    log_overrides: Vec<String>,

    /// Write board logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the final debug state to this file as JSON
    #[arg(long, default_value = "state.json")]
    save: String,

    /// Print per-frame pixels + debug_state
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Suppress all per-frame output (still writes --save)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn configure_logging(args: &Args) -> Result<()> {
    let config = LogConfig::global();
    let level = LogLevel::from_str(&args.log_level)
        .with_context(|| format!("unknown log level: {}", args.log_level))?;
    config.set_global_level(level);

    for spec in &args.log_overrides {
        let (name, level) = spec
            .split_once('=')
            .with_context(|| format!("expected CATEGORY=LEVEL, got {}", spec))?;
        let category =
            LogCategory::from_str(name).with_context(|| format!("unknown log category: {}", name))?;
        let level = LogLevel::from_str(level).with_context(|| format!("unknown log level: {}", level))?;
        config.set_level(category, level);
    }

    if let Some(path) = &args.log_file {
        config
            .set_log_file(path.clone())
            .with_context(|| format!("opening log file {}", path.display()))?;
    }
    Ok(())
}

fn select_profile(args: &Args) -> Result<GameProfile> {
    if let Some(path) = &args.profile {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        return Ok(GameProfile::from_json(&text)?);
    }
    let title = args
        .title
        .as_deref()
        .context("no title given (use --list to see built-in titles)")?;
    profile::by_name(title).ok_or_else(|| anyhow::anyhow!("Unsupported title: {}", title))
}

fn mount_roms(sys: &mut ArcadeSystem, args: &Args) -> Result<()> {
    let slots = [
        ("lane_a", &args.rom_a),
        ("lane_b", &args.rom_b),
        ("sound", &args.rom_sound),
    ];
    for (id, path) in slots {
        if let Some(path) = path {
            let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            sys.mount(id, &data)?;
            log::info!("mounted {} ({} bytes) at {}", path.display(), data.len(), id);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list {
        for title in profile::TITLES {
            println!("{}", title);
        }
        return Ok(());
    }

    let profile = select_profile(&args)?;
    if args.dump_profile {
        println!("{}", profile.to_json()?);
        return Ok(());
    }

    configure_logging(&args)?;
    log::info!("running {} for {} frame(s)", profile.name, args.frames);

    let mut sys = ArcadeSystem::new(profile)?;
    mount_roms(&mut sys, &args)?;

    for fnum in 1..=args.frames {
        let frame = sys.step_frame()?;
        if args.quiet {
            continue;
        }

        if args.debug {
            println!("Frame {}: {}x{}", fnum, frame.width, frame.height);
            let dump_len = std::cmp::min(16, frame.pixels.len());
            let mut out = String::new();
            for px in &frame.pixels[..dump_len] {
                out.push_str(&format!("{:08X} ", px));
            }
            println!("First {} pixels: {}", dump_len, out);
            println!(
                "DEBUG STATE (frame {}):\n{}",
                fnum,
                serde_json::to_string_pretty(&sys.debug_state())?
            );
        } else {
            let stats = sys.last_stats();
            println!(
                "Frame {}: {} cells redrawn, {} sprites",
                fnum,
                stats.background.redrawn,
                stats.small_sprites.drawn + stats.big_sprites.drawn
            );
        }
    }

    let mut f = File::create(&args.save)?;
    write!(f, "{}", serde_json::to_string_pretty(&sys.debug_state())?)?;
    LogConfig::global().clear_log_file();

    Ok(())
}
