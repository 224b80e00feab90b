use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use subtitle_engine::{
    AudioClip, AudioPlayer, DwellFallback, ImageSlot, NameDisplay, PlaybackState, ScaleMode,
    ScriptSource, Session, SpriteHandle, Stage, SubtitleConfig, Surface, TextPresenter, Timeline,
};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about = "Subtitle script tooling")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// TOML configuration; defaults apply when omitted or missing.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a script and print its speech units.
    Compile {
        script: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Play a script headlessly, printing what each collaborator receives.
    Play {
        script: PathBuf,
        /// Clock step per update, in milliseconds.
        #[arg(long, default_value_t = 100)]
        step_ms: u64,
        /// Fixed dwell in seconds for units without duration or audio.
        #[arg(long)]
        dwell: Option<f32>,
        /// Audio clip per line, as LINE=SECONDS.
        #[arg(long = "clip", value_parser = parse_clip)]
        clips: Vec<(usize, f32)>,
        /// Give up after this many updates.
        #[arg(long, default_value_t = 10_000)]
        max_updates: usize,
    },
    /// Split line clip lengths across their paginated units.
    Estimate {
        script: PathBuf,
        /// Audio clip per line, as LINE=SECONDS.
        #[arg(long = "clip", value_parser = parse_clip, required = true)]
        clips: Vec<(usize, f32)>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Tabled, Serialize)]
struct UnitRow {
    index: usize,
    line: String,
    speaker: String,
    text: String,
    #[tabled(display_with = "display_seconds")]
    seconds: Option<f32>,
    next: String,
}

fn display_seconds(seconds: &Option<f32>) -> String {
    seconds.map(|secs| format!("{secs:.2}")).unwrap_or_default()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Compile { script, json } => compile_command(&script, config, json),
        Command::Play {
            script,
            step_ms,
            dwell,
            clips,
            max_updates,
        } => play_command(&script, config, step_ms, dwell, &clips, max_updates),
        Command::Estimate {
            script,
            clips,
            json,
        } => estimate_command(&script, config, &clips, json),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SubtitleConfig> {
    match path {
        Some(path) => SubtitleConfig::load_from(path)
            .with_context(|| format!("load config {}", path.display())),
        None => Ok(SubtitleConfig::default()),
    }
}

fn parse_clip(raw: &str) -> Result<(usize, f32), String> {
    let (line, seconds) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LINE=SECONDS, got '{raw}'"))?;
    let line = line
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("bad line number '{line}': {err}"))?;
    let seconds = seconds
        .trim()
        .parse::<f32>()
        .map_err(|err| format!("bad clip length '{seconds}': {err}"))?;
    if line == 0 {
        return Err("line numbers start at 1".to_string());
    }
    Ok((line, seconds))
}

fn compile_timeline(path: &Path, config: &SubtitleConfig) -> Result<Timeline> {
    let source = ScriptSource::from_path(path)?;
    let mut names = config.name_registry();
    Ok(source.compile(config, &mut names))
}

fn attach_clips(timeline: &mut Timeline, clips: &[(usize, f32)]) -> Result<()> {
    for &(line, seconds) in clips {
        let clip = AudioClip::new(format!("line_{line}"), seconds);
        timeline
            .attach_audio(line, clip)
            .with_context(|| format!("attach clip to line {line}"))?;
    }
    Ok(())
}

fn unit_rows(timeline: &Timeline) -> Vec<UnitRow> {
    timeline
        .groups
        .iter()
        .flat_map(|group| {
            group.range().map(move |index| (group.label.clone(), index))
        })
        .filter_map(|(line, index)| {
            let unit = timeline.get(index)?;
            Some(UnitRow {
                index,
                line,
                speaker: unit.speaker_name.clone(),
                text: unit.text.clone(),
                seconds: unit.dwell().map(|dwell| dwell.as_secs_f32()),
                next: format!("{:?}", unit.next_action),
            })
        })
        .collect()
}

fn print_rows(timeline: &Timeline, json: bool) -> Result<()> {
    if json {
        println!("{}", timeline.to_json()?);
        return Ok(());
    }
    println!("{}", timeline.list_name);
    let table = Table::new(unit_rows(timeline))
        .with(Style::markdown())
        .to_string();
    println!("{table}");
    Ok(())
}

fn compile_command(path: &Path, config: SubtitleConfig, json: bool) -> Result<()> {
    let timeline = compile_timeline(path, &config)?;
    info!(units = timeline.len(), lines = timeline.groups.len(), "compiled");
    print_rows(&timeline, json)
}

fn estimate_command(
    path: &Path,
    config: SubtitleConfig,
    clips: &[(usize, f32)],
    json: bool,
) -> Result<()> {
    let mut timeline = compile_timeline(path, &config)?;
    attach_clips(&mut timeline, clips)?;
    let filled = timeline.estimate_durations();
    info!(filled, "durations estimated");
    if json {
        println!("{}", serde_json::to_string_pretty(&unit_rows(&timeline))?);
        return Ok(());
    }
    print_rows(&timeline, false)
}

fn play_command(
    path: &Path,
    mut config: SubtitleConfig,
    step_ms: u64,
    dwell: Option<f32>,
    clips: &[(usize, f32)],
    max_updates: usize,
) -> Result<()> {
    if let Some(seconds) = dwell {
        config.playback.dwell_fallback = DwellFallback::Fixed(seconds);
    }
    config.validate()?;
    if step_ms == 0 {
        bail!("--step-ms must be positive");
    }
    let mut session = Session::new(config, console_stage());
    session.load_source(path)?;
    session.compile_script()?;
    for &(line, seconds) in clips {
        session.attach_audio(line, AudioClip::new(format!("line_{line}"), seconds))?;
    }
    session.start()?;

    let step = Duration::from_millis(step_ms);
    let mut elapsed = Duration::ZERO;
    for _ in 0..max_updates {
        if session.state() == PlaybackState::Stopped || session.pending_delay().is_none() {
            break;
        }
        session.update(step)?;
        elapsed += step;
    }
    if session.state() != PlaybackState::Stopped {
        bail!(
            "playback did not finish after {:.1}s (state {:?})",
            elapsed.as_secs_f32(),
            session.state()
        );
    }
    info!(elapsed = ?elapsed, "playback finished");
    Ok(())
}

/// Prints every presentation call to stdout.
#[derive(Clone, Copy)]
struct Console;

struct ConsoleSlot(&'static str);

fn console_stage() -> Stage {
    Stage::headless()
        .with_surface(Console)
        .with_text(Console)
        .with_name(Console)
        .with_audio(Console)
        .with_portrait(ConsoleSlot("portrait"))
        .with_pose(ConsoleSlot("pose"))
        .with_sprites(Console)
}

impl Surface for Console {
    fn set_visible(&mut self, visible: bool) {
        println!("[surface] {}", if visible { "shown" } else { "hidden" });
    }
}

impl TextPresenter for Console {
    fn type_text(&mut self, text: &str, letter_delay: f32) {
        println!("[text] {text} ({letter_delay:.3}s/letter)");
    }
}

impl NameDisplay for Console {
    fn set_text(&mut self, text: &str) {
        println!("[name] {text}");
    }
}

impl AudioPlayer for Console {
    fn play_one_shot(&mut self, clip: &AudioClip) {
        println!("[audio] play {} ({:.2}s)", clip.id, clip.length);
    }

    fn stop(&mut self) {
        println!("[audio] stop");
    }

    fn pause(&mut self) {
        println!("[audio] pause");
    }

    fn resume(&mut self) {
        println!("[audio] resume");
    }
}

impl subtitle_engine::SpriteResolver for Console {
    fn resolve(&self, name: &str) -> Option<SpriteHandle> {
        (!name.is_empty()).then(|| SpriteHandle(name.to_string()))
    }
}

impl ImageSlot for ConsoleSlot {
    fn set_sprite(&mut self, sprite: Option<&SpriteHandle>) {
        match sprite {
            Some(handle) => println!("[{}] sprite {}", self.0, handle.0),
            None => println!("[{}] no sprite", self.0),
        }
    }

    fn set_active(&mut self, _active: bool) {}

    fn apply_native_size(&mut self, mode: ScaleMode, factor: f32) {
        println!("[{}] native size {mode:?} x{factor}", self.0);
    }
}
