use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ribexport", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the full scene for one frame or a frame range.
    Export(ExportArgs),
    /// Export selected objects as archives.
    Archive(ArchiveArgs),
    /// Bring one texture's optimized file up to date.
    OptimizeTexture(OptimizeArgs),
    /// Compile a shader source next to itself.
    CompileShader(CompileArgs),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Input scene snapshot JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Exporter configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Single frame (defaults to the scene's current frame).
    #[arg(long, conflicts_with_all = ["start", "end"])]
    frame: Option<i64>,

    /// First frame of a numbered sequence.
    #[arg(long, requires = "end")]
    start: Option<i64>,

    /// Last frame of a numbered sequence (inclusive).
    #[arg(long, requires = "start")]
    end: Option<i64>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[command(flatten)]
    frames: FrameArgs,

    /// Output RIB path (sequence base name with --start/--end).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ArchiveArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[command(flatten)]
    frames: FrameArgs,

    /// Object to include; repeat for several.
    #[arg(long = "object", required = true)]
    objects: Vec<String>,

    /// Write static archives without motion blocks.
    #[arg(long)]
    no_motion: bool,

    /// Output archive path (sequence base name with --start/--end).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct OptimizeArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Texture name in the scene.
    #[arg(long)]
    texture: String,

    /// Frame for animated sequences (defaults to the scene's current frame).
    #[arg(long)]
    frame: Option<i64>,
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Shader source file.
    #[arg(long)]
    source: PathBuf,

    /// Compiler executable (overrides the configuration).
    #[arg(long)]
    compiler: Option<PathBuf>,

    /// Exporter configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Archive(args) => cmd_archive(args),
        Command::OptimizeTexture(args) => cmd_optimize(args),
        Command::CompileShader(args) => cmd_compile(args),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<ribexport::ExportConfig> {
    let cfg = match path {
        Some(p) => ribexport::ExportConfig::from_file(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => ribexport::ExportConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn read_scene(
    args: &SceneArgs,
) -> anyhow::Result<(ribexport::SceneSnapshot, ribexport::ExportConfig)> {
    let scene = ribexport::SceneSnapshot::from_file(&args.scene)
        .with_context(|| format!("load scene '{}'", args.scene.display()))?;
    let cfg = read_config(args.config.as_deref())?;
    Ok((scene, cfg))
}

fn frame_selection(args: &FrameArgs) -> ribexport::FrameSelection {
    match (args.frame, args.start, args.end) {
        (Some(f), _, _) => ribexport::FrameSelection::Single(ribexport::Frame(f)),
        (None, Some(start), Some(end)) => ribexport::FrameSelection::Sequence {
            start: ribexport::Frame(start),
            end: ribexport::Frame(end),
        },
        _ => ribexport::FrameSelection::Current,
    }
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let (scene, cfg) = read_scene(&args.scene)?;
    let opts =
        ribexport::ExportOptions::new(&args.out).with_frames(frame_selection(&args.frames));
    let result = ribexport::export(&scene, None, &opts, cfg)?;
    report(&result)
}

fn cmd_archive(args: ArchiveArgs) -> anyhow::Result<()> {
    let (scene, cfg) = read_scene(&args.scene)?;
    let mut opts =
        ribexport::ExportOptions::new(&args.out).with_frames(frame_selection(&args.frames));
    opts.archive_motion = !args.no_motion;
    let result = ribexport::export(&scene, Some(args.objects.as_slice()), &opts, cfg)?;
    report(&result)
}

fn report(result: &ribexport::ExportResult) -> anyhow::Result<()> {
    for w in &result.warnings {
        eprintln!("warning: {w}");
    }
    for e in &result.errors {
        eprintln!("error: {e}");
    }
    for p in &result.written_paths {
        eprintln!("wrote {}", p.display());
    }
    if result.cancelled {
        eprintln!("cancelled");
    }
    if result.state == ribexport::SessionState::Failed {
        anyhow::bail!(
            "every frame failed ({} of {})",
            result.stats.frames_failed,
            result.stats.frames_total
        );
    }
    Ok(())
}

fn cmd_optimize(args: OptimizeArgs) -> anyhow::Result<()> {
    let (scene, cfg) = read_scene(&args.scene)?;
    let texture = scene
        .textures
        .get(&args.texture)
        .with_context(|| format!("texture '{}' is not in the scene", args.texture))?;
    let frame = ribexport::Frame(args.frame.unwrap_or(scene.settings.frame_current));

    let resolver = ribexport::PathResolver::new(cfg.paths.clone());
    let optimizer =
        ribexport::TextureOptimizer::new(&resolver, &cfg.optimizer, &ribexport::SystemRunner);
    let path = optimizer
        .ensure_optimized(&args.texture, texture, frame)
        .with_context(|| format!("optimize texture '{}'", args.texture))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref())?;
    let compiler = args.compiler.unwrap_or(cfg.shader_compiler);
    let out_dir = ribexport::compile_shader(&ribexport::SystemRunner, &compiler, &args.source)
        .with_context(|| format!("compile shader '{}'", args.source.display()))?;
    eprintln!("compiled into {}", out_dir.display());
    Ok(())
}
