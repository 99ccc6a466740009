use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use frame_studio::assets::decode::{load_image, load_image_file, save_image};
use frame_studio::encode::ffmpeg::ensure_parent_dir;
use frame_studio::imaging::chroma::{key_character, remove_color};
use frame_studio::imaging::grid::{compose_contact_sheet, slice_grid};
use frame_studio::media::audio::load_speech;
use frame_studio::service::gemini::{AspectRatio, ImageModel, ImageSize};
use frame_studio::{
    ActionFrames, AudioInputConfig, Character, ChromaKey, FfmpegSink, FfmpegSinkOpts, FfmpegVideo,
    GeminiClient, ImageRef, LipSyncEngine, Rgb8, SegmentStore, SpectrumAnalyser, StudioConfig,
    render_lipsync,
};

#[derive(Parser, Debug)]
#[command(name = "frame-studio", version)]
struct Cli {
    /// JSON config file; missing sections use defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless `RUST_LOG` is set.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Slice a grid image into row-major PNG cells.
    Slice(SliceArgs),
    /// Key a background color out of an image or every frame of a pack.
    Key(KeyArgs),
    /// Extract evenly spaced stills from a video (requires `ffmpeg`).
    Extract(ExtractArgs),
    /// Tile images into a numbered contact sheet (JPEG).
    Sheet(SheetArgs),
    /// Extract, curate with the vision model, and export an action pack.
    Curate(CurateArgs),
    /// Generate or edit an image with the generative service.
    Generate(GenerateArgs),
    /// Synthesize speech to a WAV file.
    Speak(SpeakArgs),
    /// Render a lip-synced MP4 of a character speaking (requires `ffmpeg`).
    Lipsync(LipsyncArgs),
}

#[derive(Parser, Debug)]
struct SliceArgs {
    /// Input grid image.
    #[arg(long = "in")]
    in_path: PathBuf,
    #[arg(long, default_value_t = 3)]
    rows: u32,
    #[arg(long, default_value_t = 3)]
    cols: u32,
    /// Output directory for `cell_NN.png`.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct KeyArgs {
    /// Input image, or a pack JSON (`.json`).
    #[arg(long = "in")]
    in_path: PathBuf,
    /// Output PNG or pack JSON.
    #[arg(long)]
    out: PathBuf,
    /// Per-channel tolerance; overrides the config.
    #[arg(long)]
    tolerance: Option<u8>,
    /// Target color as `rrggbb`; overrides the config.
    #[arg(long)]
    target: Option<String>,
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Source video.
    #[arg(long)]
    video: PathBuf,
    /// Number of stills; overrides the config.
    #[arg(long)]
    frames: Option<u32>,
    /// Output directory for `frame_NNN.png`.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct SheetArgs {
    /// Output JPEG.
    #[arg(long)]
    out: PathBuf,
    /// Input images in badge order.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct CurateArgs {
    /// Source video.
    #[arg(long)]
    video: PathBuf,
    /// Target action, e.g. "blinking"; blank means movement or talking.
    #[arg(long, default_value = "")]
    intent: String,
    /// Segment (action) name.
    #[arg(long, default_value = "Base")]
    name: String,
    /// Number of stills; overrides the config.
    #[arg(long)]
    frames: Option<u32>,
    /// Output pack JSON.
    #[arg(long)]
    out: PathBuf,
    /// Write the legacy single-action shape instead of a pack.
    #[arg(long)]
    legacy: bool,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Prompt text; blank uses the default prompt.
    #[arg(long, default_value = "")]
    prompt: String,
    /// Image to edit.
    #[arg(long)]
    source: Option<String>,
    /// `flash` or `pro`; overrides the config.
    #[arg(long)]
    model: Option<String>,
    /// Aspect ratio such as `1:1` or `16:9`; overrides the config.
    #[arg(long)]
    aspect: Option<String>,
    /// `1K`, `2K` or `4K` (pro model only); overrides the config.
    #[arg(long)]
    size: Option<String>,
    /// Generate a 3x3 talking sheet of `--source` and write the 9 frames instead.
    #[arg(long, requires = "source")]
    talking: bool,
    /// Output PNG, or output directory with `--talking`.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SpeakArgs {
    /// Text to speak.
    #[arg(long)]
    text: String,
    /// Output WAV.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct LipsyncArgs {
    /// Character or action pack JSON.
    #[arg(long)]
    pack: PathBuf,
    /// Speech audio (WAV or raw 24 kHz 16-bit PCM).
    #[arg(long)]
    speech: PathBuf,
    /// Output MP4.
    #[arg(long)]
    out: PathBuf,
    /// Idle action name; defaults to the pack default.
    #[arg(long)]
    idle: Option<String>,
    /// Talking action name; defaults to the pack default.
    #[arg(long)]
    talking: Option<String>,
    /// Blink action name; no blinking when omitted.
    #[arg(long)]
    blink: Option<String>,
    /// Key the background out of every frame first.
    #[arg(long)]
    key: bool,
    /// Seed for blink timing.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match &cli.config {
        Some(path) => StudioConfig::load(path)?,
        None => StudioConfig::default(),
    };

    match cli.cmd {
        Command::Slice(args) => cmd_slice(args),
        Command::Key(args) => cmd_key(&cfg, args),
        Command::Extract(args) => cmd_extract(&cfg, args),
        Command::Sheet(args) => cmd_sheet(&cfg, args),
        Command::Curate(args) => cmd_curate(&cfg, args),
        Command::Generate(args) => cmd_generate(&cfg, args),
        Command::Speak(args) => cmd_speak(&cfg, args),
        Command::Lipsync(args) => cmd_lipsync(&cfg, args),
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_slice(args: SliceArgs) -> anyhow::Result<()> {
    let src = load_image_file(&args.in_path)?;
    let cells = slice_grid(&src, args.rows, args.cols)?;
    for (i, cell) in cells.iter().enumerate() {
        save_image(cell, &args.out_dir.join(format!("cell_{i:02}.png")))?;
    }
    eprintln!("wrote {} cells to {}", cells.len(), args.out_dir.display());
    Ok(())
}

fn cmd_key(cfg: &StudioConfig, args: KeyArgs) -> anyhow::Result<()> {
    let mut key: ChromaKey = cfg.chroma;
    if let Some(t) = args.tolerance {
        key.tolerance = t;
    }
    if let Some(hex) = &args.target {
        key.target = Rgb8::from_hex(hex)?;
    }

    if is_json(&args.in_path) {
        let character = Character::load(&args.in_path)?;
        let keyed = key_character(&character, &key)?;
        write_text(&args.out, &keyed.to_json_pretty()?)?;
    } else {
        let src = load_image_file(&args.in_path)?;
        save_image(&remove_color(&src, &key), &args.out)?;
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_extract(cfg: &StudioConfig, args: ExtractArgs) -> anyhow::Result<()> {
    let count = args.frames.unwrap_or(cfg.sampler.frame_count);
    let mut store = SegmentStore::new();
    let id = store.active_id().to_string();
    store.set_source_video(&id, Some(args.video.clone()))?;

    let mut video = FfmpegVideo::open(&args.video)?;
    store.extract_into(&id, &mut video, count, |p| {
        tracing::debug!(progress = p, "extracting");
    })?;

    for (i, frame) in store.active().frames.iter().enumerate() {
        let img = load_image(&frame.url)?;
        save_image(&img, &args.out_dir.join(format!("frame_{i:03}.png")))?;
    }
    eprintln!(
        "wrote {} frames to {}",
        store.active().frames.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_sheet(cfg: &StudioConfig, args: SheetArgs) -> anyhow::Result<()> {
    let images = args
        .images
        .iter()
        .map(|p| load_image_file(p))
        .collect::<Result<Vec<_>, _>>()?;
    let sheet = compose_contact_sheet(&images, &cfg.sheet)?;
    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, sheet.to_jpeg(cfg.sheet.jpeg_quality)?)
        .with_context(|| format!("write sheet '{}'", args.out.display()))?;
    eprintln!(
        "wrote {} ({}x{} cells)",
        args.out.display(),
        sheet.columns,
        sheet.rows
    );
    Ok(())
}

fn cmd_curate(cfg: &StudioConfig, args: CurateArgs) -> anyhow::Result<()> {
    let client = GeminiClient::from_env(cfg.service.clone())?;
    let count = args.frames.unwrap_or(cfg.sampler.frame_count);

    let mut store = SegmentStore::new();
    let id = store.active_id().to_string();
    store.rename(&id, args.name.clone())?;
    store.set_intent(&id, args.intent.clone())?;
    store.set_source_video(&id, Some(args.video.clone()))?;

    let mut video = FfmpegVideo::open(&args.video)?;
    store.extract_into(&id, &mut video, count, |_| {})?;
    let preview = store.curate_segment(&id, &client, &cfg.sheet)?;
    let (_, frames) = store.preview_sequence(&id, preview)?;
    tracing::info!(preview = %preview, frames = frames.len(), "curation finished");

    let json = if args.legacy {
        serde_json::to_string_pretty(&store.export_active())
            .context("serialize legacy action")?
    } else {
        store.export_all()?.to_json_pretty()?
    };
    write_text(&args.out, &json)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_generate(cfg: &StudioConfig, args: GenerateArgs) -> anyhow::Result<()> {
    let mut opts = cfg.service.clone();
    if let Some(m) = &args.model {
        opts.image_model = m.parse::<ImageModel>()?;
    }
    if let Some(a) = &args.aspect {
        opts.aspect_ratio = a.parse::<AspectRatio>()?;
    }
    if let Some(s) = &args.size {
        opts.image_size = s.parse::<ImageSize>()?;
    }
    let client = GeminiClient::from_env(opts)?;
    let source = args.source.as_deref().map(ImageRef::new);

    match (&source, args.talking) {
        (Some(src), true) => {
            let frames = client.generate_talking_frames(src)?;
            for (i, f) in frames.iter().enumerate() {
                save_image(&load_image(f)?, &args.out.join(format!("talk_{i:02}.png")))?;
            }
            eprintln!("wrote {} frames to {}", frames.len(), args.out.display());
        }
        _ => {
            let url = client.generate_image(&args.prompt, source.as_ref())?;
            save_image(&load_image(&url)?, &args.out)?;
            eprintln!("wrote {}", args.out.display());
        }
    }
    Ok(())
}

fn cmd_speak(cfg: &StudioConfig, args: SpeakArgs) -> anyhow::Result<()> {
    let client = GeminiClient::from_env(cfg.service.clone())?;
    let clip = client.synthesize_speech(&args.text)?;
    clip.write_wav(&args.out)?;
    eprintln!(
        "wrote {} ({:.2}s)",
        args.out.display(),
        clip.duration_sec()
    );
    Ok(())
}

fn cmd_lipsync(cfg: &StudioConfig, args: LipsyncArgs) -> anyhow::Result<()> {
    let mut character = Character::load(&args.pack)?;
    if args.key {
        character = key_character(&character, &cfg.chroma)?;
    }
    let actions = ActionFrames::from_character(
        &character,
        args.idle.as_deref(),
        args.talking.as_deref(),
        args.blink.as_deref(),
    )?;
    let scene = character.scene_config.clone().unwrap_or_default();
    let speech = load_speech(&args.speech)?;

    ensure_parent_dir(&args.out)?;
    let audio_path = args.out.with_extension("f32le");
    speech
        .with_leading_silence(cfg.render.lead_in_sec)
        .write_f32le(&audio_path)?;
    let audio = AudioInputConfig {
        path: audio_path.clone(),
        sample_rate: speech.sample_rate,
        channels: 1,
    };

    let analyser = SpectrumAnalyser::new(cfg.analyser);
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut engine = LipSyncEngine::with_rng(cfg.playback.clone(), analyser, rng)?;
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        background: cfg.render.stage.backdrop,
        ..FfmpegSinkOpts::new(&args.out)
    });

    let result = render_lipsync(
        &mut engine,
        actions,
        &scene,
        speech,
        &cfg.render,
        Some(audio),
        &mut sink,
    );
    let _ = std::fs::remove_file(&audio_path);
    let stats = result?;

    eprintln!(
        "wrote {} ({} frames, {} talking)",
        args.out.display(),
        stats.frames,
        stats.talking_frames
    );
    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    std::fs::write(path, text).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}
