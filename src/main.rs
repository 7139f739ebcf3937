use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::PathBuf;
use video_mixer_lib::mixer::{
    load_settings, load_settings_from, resolve_ffprobe_binary, scan_source_root, tool_status,
    MixRequest, MixerSettings, ProgressEvent, VideoMixer,
};

#[derive(Parser)]
#[command(
    name = "video-mixer",
    version,
    about = "Mix one random clip from each source folder into a single stream-copied video"
)]
struct Cli {
    /// Settings file to use instead of the per-user one.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the source folders under ROOT with their eligible clip counts
    Scan {
        root: PathBuf,

        /// Print folder descriptors as JSON
        #[arg(long)]
        json: bool,
    },
    /// Draw one clip per source folder under ROOT, shuffle and concatenate them
    Mix {
        root: PathBuf,

        /// Only use these subfolders (repeatable). Default: every subfolder.
        #[arg(long = "folder", value_name = "NAME")]
        folders: Vec<String>,

        /// Write the result here instead of the configured output directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// FFmpeg binary to use instead of the configured/system one.
        #[arg(long)]
        ffmpeg: Option<PathBuf>,

        /// Seed the random draw for a reproducible mix.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show which FFmpeg/ffprobe binaries will be used
    Tools,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let settings = match cli.settings.as_deref() {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    }
    .context("failed to load settings")?;

    match cli.cmd {
        Commands::Scan { root, json } => scan(&settings, root, json),
        Commands::Mix {
            root,
            folders,
            output_dir,
            ffmpeg,
            seed,
        } => {
            let mut settings = settings;
            if let Some(dir) = output_dir {
                settings.output_dir = Some(dir.to_string_lossy().to_string());
            }
            let mixer = match ffmpeg {
                Some(binary) => VideoMixer::new(binary, settings.resolve_output_dir()?)
                    .with_ffprobe(resolve_ffprobe_binary(&settings))
                    .with_media_filter(settings.media_filter())
                    .with_output_extension(&settings.output_extension)
                    .keep_partial_output(settings.keep_partial_output),
                None => VideoMixer::from_settings(&settings)?,
            };
            mix(&mixer, root, folders, seed)
        }
        Commands::Tools => {
            let status = tool_status(&settings);
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
    }
}

fn scan(settings: &MixerSettings, root: PathBuf, json: bool) -> Result<()> {
    let folders = scan_source_root(&root, &settings.media_filter())
        .with_context(|| format!("failed to scan {}", root.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&folders)?);
        return Ok(());
    }
    for folder in &folders {
        println!("{:>5}  {}", folder.video_count, folder.name);
    }
    Ok(())
}

fn mix(mixer: &VideoMixer, root: PathBuf, names: Vec<String>, seed: Option<u64>) -> Result<()> {
    let mut folders = mixer
        .scan(&root)
        .with_context(|| format!("failed to scan {}", root.display()))?;
    if !names.is_empty() {
        if let Some(unknown) = names
            .iter()
            .find(|name| !folders.iter().any(|folder| &folder.name == *name))
        {
            bail!("no subfolder named {unknown:?} under {}", root.display());
        }
        folders.retain(|folder| names.contains(&folder.name));
    }

    let observer = |event: &ProgressEvent| {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{:>3}%  {}", event.percent, event.timemark);
        let _ = stderr.flush();
    };
    let request = MixRequest { folders };
    let outcome = match seed {
        Some(seed) => mixer.mix_with_rng(&request, &observer, &mut StdRng::seed_from_u64(seed)),
        None => mixer.mix(&request, &observer),
    };
    eprintln!();
    let outcome = outcome?;

    for clip in &outcome.clips {
        log::info!("mixed {}", clip.display());
    }
    println!("{}", outcome.output_path.display());
    Ok(())
}
