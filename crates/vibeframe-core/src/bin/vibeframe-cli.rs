use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use vibeframe_core::{
    AddClipRequest, AddEffectRequest, AddSourceRequest, AddTrackRequest, AppConfig, AspectRatio,
    EffectKind, ParamValue, Project, SourceKind, TrackKind,
    diagnostics::init_tracing,
    persistence::{default_project_path, load_project, save_project},
    time::{format_timecode, parse_timecode},
};

#[derive(Debug, Parser)]
#[command(name = "vibeframe-cli")]
#[command(about = "Edit VibeFrame project timelines from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project file; defaults to `paths.project_file` from the config.
    #[arg(long, short, global = true)]
    project: Option<PathBuf>,

    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new project file with a default video and audio track.
    Init {
        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_parser = parse_aspect_ratio)]
        aspect: Option<AspectRatio>,

        /// Overwrite an existing project file.
        #[arg(long)]
        force: bool,

        /// Create `<dir>/<name-slug>.vibe.json`; takes precedence over `--project`.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print a summary of the project.
    Info,
    #[command(subcommand)]
    Source(SourceCommand),
    #[command(subcommand)]
    Track(TrackCommand),
    #[command(subcommand)]
    Clip(ClipCommand),
    #[command(subcommand)]
    Effect(EffectCommand),
    /// Set the output aspect ratio (16:9, 9:16 or 1:1).
    Aspect {
        #[arg(value_parser = parse_aspect_ratio)]
        ratio: AspectRatio,
    },
    /// Remove every clip, then every track.
    Clear {
        #[arg(long)]
        keep_tracks: bool,
    },
}

#[derive(Debug, Subcommand)]
enum SourceCommand {
    Add {
        url: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type", value_enum)]
        kind: SourceKindArg,

        /// Required for video and audio; images fall back to the configured still length.
        #[arg(long, value_parser = parse_time)]
        duration: Option<f64>,
    },
    Remove {
        id: String,
    },
    List,
}

#[derive(Debug, Subcommand)]
enum TrackCommand {
    Add {
        #[arg(long = "type", value_enum)]
        kind: TrackKindArg,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        order: Option<i32>,
    },
    Remove {
        id: String,
    },
    List,
}

#[derive(Debug, Subcommand)]
enum ClipCommand {
    Add(ClipAddArgs),
    List,
    Remove {
        id: String,
    },
    /// Split a clip at a time relative to its own start.
    Split {
        id: String,

        #[arg(value_parser = parse_time)]
        at: f64,
    },
    /// Move the clip's start edge to a new timeline position.
    TrimStart {
        id: String,

        #[arg(value_parser = parse_time)]
        start: f64,
    },
    /// Set the clip's length, moving only its end edge.
    TrimEnd {
        id: String,

        #[arg(value_parser = parse_time)]
        duration: f64,
    },
    Move {
        id: String,

        #[arg(long)]
        track: String,

        #[arg(long, value_parser = parse_time)]
        start: f64,
    },
    Duplicate {
        id: String,

        /// Defaults to right after the original.
        #[arg(long, value_parser = parse_time)]
        start: Option<f64>,
    },
}

#[derive(Debug, Args)]
struct ClipAddArgs {
    #[arg(long)]
    source: String,

    /// Defaults to the first track that accepts the source's media kind.
    #[arg(long)]
    track: Option<String>,

    #[arg(long, default_value = "0", value_parser = parse_time)]
    start: f64,

    /// Offset into the source media.
    #[arg(long, default_value = "0", value_parser = parse_time)]
    offset: f64,

    /// Defaults to the rest of the source after `--offset`.
    #[arg(long, value_parser = parse_time)]
    duration: Option<f64>,
}

#[derive(Debug, Subcommand)]
enum EffectCommand {
    Add {
        clip_id: String,

        #[arg(long = "type", value_parser = parse_effect_kind)]
        kind: EffectKind,

        #[arg(long, default_value = "0", value_parser = parse_time)]
        start: f64,

        #[arg(long, value_parser = parse_time)]
        duration: f64,

        /// `key=value`; may be repeated.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, ParamValue)>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceKindArg {
    Video,
    Audio,
    Image,
}

impl From<SourceKindArg> for SourceKind {
    fn from(value: SourceKindArg) -> Self {
        match value {
            SourceKindArg::Video => Self::Video,
            SourceKindArg::Audio => Self::Audio,
            SourceKindArg::Image => Self::Image,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TrackKindArg {
    Video,
    Audio,
}

impl From<TrackKindArg> for TrackKind {
    fn from(value: TrackKindArg) -> Self {
        match value {
            TrackKindArg::Video => Self::Video,
            TrackKindArg::Audio => Self::Audio,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default()?;
    let log_dir = cli.log_dir.clone().unwrap_or_else(|| config.paths.logs_dir.clone());
    let _telemetry = init_tracing(&log_dir, &config.diagnostics)?;

    let project_path = cli
        .project
        .clone()
        .unwrap_or_else(|| config.paths.project_file.clone());

    match cli.command {
        Commands::Init {
            name,
            aspect,
            force,
            dir,
        } => {
            let name = name.unwrap_or_else(|| config.project.default_name.clone());
            let project_path = dir.map_or(project_path, |dir| default_project_path(&dir, &name));
            if project_path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite it",
                    project_path.display()
                );
            }
            let mut project = Project::new(name);
            project.set_aspect_ratio(aspect.unwrap_or(config.project.default_aspect_ratio));
            save_project(&project_path, &project)?;
            println!(
                "Created project '{}' at {}",
                project.meta().name,
                project_path.display()
            );
        }
        Commands::Info => print_info(&open(&project_path)?),
        Commands::Source(command) => run_source(command, &project_path, &config)?,
        Commands::Track(command) => run_track(command, &project_path)?,
        Commands::Clip(command) => run_clip(command, &project_path)?,
        Commands::Effect(command) => run_effect(command, &project_path)?,
        Commands::Aspect { ratio } => {
            let mut project = open(&project_path)?;
            project.set_aspect_ratio(ratio);
            save_project(&project_path, &project)?;
            println!("Aspect ratio set to {ratio}");
        }
        Commands::Clear { keep_tracks } => {
            let mut project = open(&project_path)?;
            let (clips, tracks) = clear(&mut project, keep_tracks);
            save_project(&project_path, &project)?;
            println!("Removed {clips} clip(s) and {tracks} track(s)");
        }
    }

    Ok(())
}

fn run_source(command: SourceCommand, path: &Path, config: &AppConfig) -> anyhow::Result<()> {
    let mut project = open(path)?;
    match command {
        SourceCommand::Add {
            url,
            name,
            kind,
            duration,
        } => {
            let kind = SourceKind::from(kind);
            let duration = match (kind, duration) {
                (_, Some(duration)) => duration,
                (SourceKind::Image, None) => config.project.default_image_duration,
                (_, None) => bail!("--duration is required for {} sources", kind.as_str()),
            };
            let name = name.unwrap_or_else(|| file_name_of(&url));
            let source = project.add_source(AddSourceRequest {
                name,
                kind,
                url,
                duration,
            })?;
            save_project(path, &project)?;
            println!("Added source {} ({})", source.id, source.name);
        }
        SourceCommand::Remove { id } => {
            if !project.remove_source(&id) {
                bail!("source not found: {id}");
            }
            save_project(path, &project)?;
            println!("Removed source {id}");
        }
        SourceCommand::List => {
            for source in project.get_sources() {
                println!(
                    "{}  {:<5}  {:>11}  {}  {}",
                    source.id,
                    source.kind.as_str(),
                    format_timecode(source.duration),
                    source.name,
                    source.url
                );
            }
        }
    }
    Ok(())
}

fn run_track(command: TrackCommand, path: &Path) -> anyhow::Result<()> {
    let mut project = open(path)?;
    match command {
        TrackCommand::Add { kind, name, order } => {
            let kind = TrackKind::from(kind);
            let count = project.get_tracks_by_type(kind).len();
            let label = match kind {
                TrackKind::Video => "Video",
                TrackKind::Audio => "Audio",
            };
            let name = name.unwrap_or_else(|| format!("{label} {}", count + 1));
            let mut request = AddTrackRequest::new(name, kind);
            if let Some(order) = order {
                request.order = order;
            }
            let track = project.add_track(request);
            save_project(path, &project)?;
            println!("Added track {} ({})", track.id, track.name);
        }
        TrackCommand::Remove { id } => {
            if !project.remove_track(&id) {
                bail!("track not found: {id}");
            }
            save_project(path, &project)?;
            println!("Removed track {id}");
        }
        TrackCommand::List => {
            for track in project.tracks_by_layer() {
                let clips = project.clips_on_track(&track.id).len();
                println!(
                    "{}  {:<5}  order {:>2}  {} clip(s)  {}{}{}",
                    track.id,
                    track.kind.as_str(),
                    track.order,
                    clips,
                    track.name,
                    if track.is_muted { "  [muted]" } else { "" },
                    if track.is_locked { "  [locked]" } else { "" },
                );
            }
        }
    }
    Ok(())
}

fn run_clip(command: ClipCommand, path: &Path) -> anyhow::Result<()> {
    let mut project = open(path)?;
    match command {
        ClipCommand::Add(args) => {
            let source = project
                .get_source(&args.source)
                .with_context(|| format!("source not found: {}", args.source))?
                .clone();
            let track_id = match args.track {
                Some(track_id) => {
                    if project.get_track(&track_id).is_none() {
                        bail!("track not found: {track_id}");
                    }
                    track_id
                }
                None => project
                    .get_tracks()
                    .iter()
                    .find(|track| track.kind.accepts(source.kind))
                    .map(|track| track.id.clone())
                    .with_context(|| {
                        format!("no track accepts {} sources", source.kind.as_str())
                    })?,
            };
            let duration = args
                .duration
                .unwrap_or(source.duration - args.offset);
            let clip = project.add_clip(AddClipRequest {
                source_id: source.id.clone(),
                track_id,
                start_time: args.start,
                duration,
                source_start_offset: args.offset,
                source_end_offset: args.offset + duration,
            })?;
            save_project(path, &project)?;
            println!(
                "Added clip {} at {} ({})",
                clip.id,
                format_timecode(clip.start_time),
                format_timecode(clip.duration)
            );
        }
        ClipCommand::List => {
            for listing in project.clip_listing() {
                let clip = listing.clip;
                println!(
                    "{}  {} - {}  track {}  source {}  [{} - {}]  {} effect(s)",
                    clip.id,
                    format_timecode(clip.start_time),
                    format_timecode(clip.end_time()),
                    listing.track_name(),
                    listing.source_name(),
                    format_timecode(clip.source_start_offset),
                    format_timecode(clip.source_end_offset),
                    clip.effects.len()
                );
            }
        }
        ClipCommand::Remove { id } => {
            if !project.remove_clip(&id) {
                bail!("clip not found: {id}");
            }
            save_project(path, &project)?;
            println!("Removed clip {id}");
        }
        ClipCommand::Split { id, at } => {
            let (first, second) = project.split_clip(&id, at)?;
            save_project(path, &project)?;
            println!("Split {id} into {} and {}", first.id, second.id);
        }
        ClipCommand::TrimStart { id, start } => {
            let clip = project.trim_clip_start(&id, start)?;
            save_project(path, &project)?;
            println!(
                "Clip {id} now starts at {} ({})",
                format_timecode(clip.start_time),
                format_timecode(clip.duration)
            );
        }
        ClipCommand::TrimEnd { id, duration } => {
            let clip = project.trim_clip_end(&id, duration)?;
            save_project(path, &project)?;
            println!("Clip {id} now ends at {}", format_timecode(clip.end_time()));
        }
        ClipCommand::Move { id, track, start } => {
            let clip = project.move_clip(&id, &track, start)?;
            save_project(path, &project)?;
            println!(
                "Moved clip {id} to track {} at {}",
                clip.track_id,
                format_timecode(clip.start_time)
            );
        }
        ClipCommand::Duplicate { id, start } => {
            let clip = project.duplicate_clip(&id, start)?;
            save_project(path, &project)?;
            println!(
                "Duplicated {id} as {} at {}",
                clip.id,
                format_timecode(clip.start_time)
            );
        }
    }
    Ok(())
}

fn run_effect(command: EffectCommand, path: &Path) -> anyhow::Result<()> {
    let mut project = open(path)?;
    match command {
        EffectCommand::Add {
            clip_id,
            kind,
            start,
            duration,
            params,
        } => {
            let request = params
                .into_iter()
                .fold(AddEffectRequest::new(kind, start, duration), |request, (key, value)| {
                    request.with_param(key, value)
                });
            let effect = project.add_effect(&clip_id, request)?;
            save_project(path, &project)?;
            println!("Added {} effect {} to clip {clip_id}", effect.kind, effect.id);
        }
    }
    Ok(())
}

/// Removes clips first so removing tracks never strands them; keeps going
/// past failures and reports what was removed.
fn clear(project: &mut Project, keep_tracks: bool) -> (usize, usize) {
    let clip_ids: Vec<String> = project.get_clips().iter().map(|clip| clip.id.clone()).collect();
    let clips = clip_ids
        .iter()
        .filter(|id| project.remove_clip(id))
        .count();

    let tracks = if keep_tracks {
        0
    } else {
        let track_ids: Vec<String> = project
            .get_tracks()
            .iter()
            .map(|track| track.id.clone())
            .collect();
        track_ids
            .iter()
            .filter(|id| project.remove_track(id))
            .count()
    };
    (clips, tracks)
}

fn print_info(project: &Project) {
    let summary = project.get_summary();
    let (width, height) = summary.aspect_ratio.dimensions();
    println!("Project:  {}", project.meta().name);
    println!("Updated:  {}", project.meta().updated_at.to_rfc3339());
    println!("Aspect:   {} ({width}x{height})", summary.aspect_ratio);
    println!("Duration: {}", format_timecode(summary.duration));
    println!("Sources:  {}", project.get_sources().len());
    println!("Tracks:   {}", project.get_tracks().len());
    println!("Clips:    {}", summary.clip_count);
    let orphans = project.orphaned_clips().len();
    if orphans > 0 {
        println!("Orphaned: {orphans} clip(s) reference a removed source or track");
    }
}

fn open(path: &Path) -> anyhow::Result<Project> {
    load_project(path).with_context(|| {
        format!(
            "could not open project {}; run `vibeframe-cli init` first",
            path.display()
        )
    })
}

fn file_name_of(url: &str) -> String {
    url.rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or(url)
        .to_string()
}

fn parse_time(raw: &str) -> Result<f64, String> {
    parse_timecode(raw).ok_or_else(|| format!("invalid time: {raw}"))
}

fn parse_aspect_ratio(raw: &str) -> Result<AspectRatio, String> {
    raw.parse()
}

fn parse_effect_kind(raw: &str) -> Result<EffectKind, String> {
    raw.parse()
}

fn parse_param(raw: &str) -> Result<(String, ParamValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw}"))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in {raw}"));
    }
    Ok((key.to_string(), ParamValue::parse_lossy(value)))
}
