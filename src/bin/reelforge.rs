use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::SeedableRng as _;

#[derive(Parser, Debug)]
#[command(name = "reelforge", version)]
struct Cli {
    /// Raise log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a captioned vertical video (requires `ffmpeg` and `ffprobe` on PATH).
    Compose(ComposeArgs),
    /// Print the caption segments for a text as JSON.
    Captions(CaptionsArgs),
    /// Render one caption overlay as a PNG.
    Caption(CaptionArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Stock video clip.
    #[arg(long, conflicts_with = "video_dir", required_unless_present = "video_dir")]
    video: Option<PathBuf>,

    /// Folder to pick a random `.mp4`/`.mov`/`.mkv` clip from.
    #[arg(long)]
    video_dir: Option<PathBuf>,

    /// Seed for the random clip pick.
    #[arg(long, requires = "video_dir")]
    seed: Option<u64>,

    /// Narration audio; sets the output duration.
    #[arg(long)]
    narration: PathBuf,

    /// Background music.
    #[arg(long)]
    music: PathBuf,

    #[command(flatten)]
    text: TextArgs,

    /// Output container. Defaults to `<text file stem>_final.mp4` beside the text file.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigArgs,

    /// Background music gain under narration.
    #[arg(long)]
    background_gain: Option<f32>,

    /// Output frame rate (integer frames per second).
    #[arg(long)]
    fps: Option<u32>,

    /// Mixed audio sample rate in Hz.
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Directory for intermediate renders.
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct TextArgs {
    /// Caption text.
    #[arg(long, conflicts_with = "text_file", required_unless_present = "text_file")]
    text: Option<String>,

    /// File holding the caption text.
    #[arg(long)]
    text_file: Option<PathBuf>,
}

impl TextArgs {
    fn load(&self) -> anyhow::Result<String> {
        match (&self.text, &self.text_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => Ok(reelforge::source::read_caption_text(path)?),
            (None, None) => anyhow::bail!("one of --text or --text-file is required"),
        }
    }
}

#[derive(clap::Args, Debug)]
struct ConfigArgs {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Caption font file.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Maximum characters per caption line.
    #[arg(long)]
    wrap_width: Option<usize>,
}

impl ConfigArgs {
    fn load(&self) -> anyhow::Result<reelforge::ReelConfig> {
        let mut config = match &self.config {
            Some(path) => reelforge::ReelConfig::from_path(path)
                .with_context(|| format!("load config '{}'", path.display()))?,
            None => reelforge::ReelConfig::default(),
        };
        if let Some(font) = &self.font {
            config.captions.font_path = Some(font.clone());
        }
        if let Some(width) = self.wrap_width {
            config.captions.wrap_width = width;
        }
        Ok(config)
    }
}

#[derive(Parser, Debug)]
struct CaptionsArgs {
    #[command(flatten)]
    text: TextArgs,

    /// Narration duration in seconds.
    #[arg(long)]
    duration: f64,

    /// Maximum characters per caption line.
    #[arg(long, default_value_t = reelforge::config::DEFAULT_WRAP_WIDTH)]
    wrap_width: usize,
}

#[derive(Parser, Debug)]
struct CaptionArgs {
    /// Caption line to render.
    #[arg(long)]
    text: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Caption font file.
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Captions(args) => cmd_captions(args),
        Command::Caption(args) => cmd_caption(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let mut config = args.overrides.load()?;
    if let Some(gain) = args.background_gain {
        config.background_gain = gain;
    }
    if let Some(fps) = args.fps {
        config.fps = reelforge::Fps::new(fps, 1)?;
    }
    if let Some(rate) = args.sample_rate {
        config.sample_rate = rate;
    }
    if let Some(dir) = args.work_dir {
        config.work_dir = Some(dir);
    }

    let out = match (&args.out, &args.text.text_file) {
        (Some(out), _) => out.clone(),
        (None, Some(text_file)) => reelforge::source::default_output_for(text_file),
        (None, None) => anyhow::bail!("--out is required when captions come from --text"),
    };
    let caption_text = args.text.load()?;
    let video = match (args.video, &args.video_dir) {
        (Some(video), _) => video,
        (None, Some(dir)) => match args.seed {
            Some(seed) => {
                reelforge::source::pick_video(dir, &mut rand::rngs::StdRng::seed_from_u64(seed))?
            }
            None => reelforge::source::pick_video(dir, &mut rand::thread_rng())?,
        },
        (None, None) => anyhow::bail!("one of --video or --video-dir is required"),
    };

    let backend = reelforge::FfmpegBackend::from_config(&config);
    let composer = reelforge::Composer::new(&backend, config)?;
    let inputs = reelforge::ReelInputs {
        video,
        narration: args.narration,
        music: args.music,
        caption_text,
    };
    let report = composer
        .compose(&inputs, &out)
        .with_context(|| format!("compose '{}'", out.display()))?;

    tracing::debug!(report = %serde_json::to_string(&report)?, "run report");
    eprintln!(
        "wrote {} ({:.3}s, {} frames, {} captions)",
        report.output.display(),
        report.duration_sec,
        report.frame_count,
        report.caption_count
    );
    Ok(())
}

fn cmd_captions(args: CaptionsArgs) -> anyhow::Result<()> {
    let text = args.text.load()?;
    let segments = reelforge::segment_captions(&text, args.wrap_width, args.duration)?;
    println!("{}", serde_json::to_string_pretty(&segments)?);
    Ok(())
}

fn cmd_caption(args: CaptionArgs) -> anyhow::Result<()> {
    let overrides = ConfigArgs {
        config: args.config,
        font: args.font,
        wrap_width: None,
    };
    let config = overrides.load()?;

    let font = reelforge::CaptionFont::resolve(config.captions.font_path.as_deref())?;
    let mut renderer = reelforge::CaptionRenderer::new(&font, &config.captions, config.target)?;
    let overlay = renderer.render_segment(&reelforge::CaptionSegment {
        text: args.text,
        start_sec: 0.0,
        duration_sec: 0.0,
    })?;

    create_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &overlay.to_straight_rgba8(),
        overlay.width,
        overlay.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
