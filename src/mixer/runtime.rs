// External tool resolution and common process primitives.
use super::*;
use std::ffi::OsStr;
#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;
use std::process::Command;
use which::which;

#[cfg(target_os = "windows")]
pub(super) const CREATE_NO_WINDOW: u32 = 0x0800_0000;

pub(super) fn hidden_command(program: impl AsRef<OsStr>) -> Command {
    let mut command = Command::new(program);
    #[cfg(target_os = "windows")]
    {
        command.creation_flags(CREATE_NO_WINDOW);
    }
    command
}

pub(super) fn canonicalize_existing_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|error| {
        MixerError::filesystem(format!("Failed to resolve {}", path.display()), error)
    })
}

pub(super) fn ensure_custom_binary(path: &str) -> Option<PathBuf> {
    let parsed = PathBuf::from(path);
    if !parsed.exists() {
        return None;
    }
    let canonical = canonicalize_existing_path(&parsed).ok()?;
    if canonical.is_file() {
        Some(canonical)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolSource {
    Custom,
    System,
}

pub(super) fn resolve_tool_binary(
    custom_path: Option<&str>,
    name: &str,
) -> Option<(PathBuf, ToolSource)> {
    if let Some(custom) = custom_path.and_then(ensure_custom_binary) {
        return Some((custom, ToolSource::Custom));
    }
    which(name)
        .ok()
        .map(|system| (system, ToolSource::System))
}

pub fn resolve_ffmpeg_binary(settings: &MixerSettings) -> Result<PathBuf> {
    resolve_tool_binary(settings.ffmpeg_custom_path.as_deref(), "ffmpeg")
        .map(|(path, _)| path)
        .ok_or_else(|| MixerError::ToolNotFound {
            tool: "FFmpeg".to_string(),
        })
}

/// ffprobe is optional: without it progress cannot be expressed as a percentage.
pub fn resolve_ffprobe_binary(settings: &MixerSettings) -> Option<PathBuf> {
    resolve_tool_binary(settings.ffprobe_custom_path.as_deref(), "ffprobe").map(|(path, _)| path)
}

pub(super) fn run_version(binary: &Path, arg: &str) -> Option<String> {
    let output = hidden_command(binary).arg(arg).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
    pub source: Option<ToolSource>,
    pub path: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsStatus {
    pub ffmpeg: ToolStatus,
    pub ffprobe: ToolStatus,
}

fn inspect_tool(name: &str, custom_path: Option<&str>) -> ToolStatus {
    match resolve_tool_binary(custom_path, name) {
        Some((path, source)) => ToolStatus {
            name: name.to_string(),
            available: true,
            source: Some(source),
            version: run_version(&path, "-version"),
            path: Some(path.to_string_lossy().to_string()),
        },
        None => ToolStatus {
            name: name.to_string(),
            available: false,
            source: None,
            path: None,
            version: None,
        },
    }
}

pub fn tool_status(settings: &MixerSettings) -> ToolsStatus {
    ToolsStatus {
        ffmpeg: inspect_tool("ffmpeg", settings.ffmpeg_custom_path.as_deref()),
        ffprobe: inspect_tool("ffprobe", settings.ffprobe_custom_path.as_deref()),
    }
}

pub(super) fn read_lossy_process_line<R: BufRead>(
    reader: &mut R,
    raw_buffer: &mut Vec<u8>,
) -> Result<Option<String>, io::Error> {
    raw_buffer.clear();
    let bytes_read = reader.read_until(b'\n', raw_buffer)?;
    if bytes_read == 0 {
        return Ok(None);
    }
    while matches!(raw_buffer.last(), Some(b'\n' | b'\r')) {
        raw_buffer.pop();
    }
    Ok(Some(String::from_utf8_lossy(raw_buffer).to_string()))
}

pub(super) fn probe_media_duration_seconds(
    ffprobe_binary: &Path,
    media_path: &Path,
) -> Option<f64> {
    let output = hidden_command(ffprobe_binary)
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(media_path)
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let raw = String::from_utf8_lossy(&output.stdout);
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// Sum of clip durations, or `None` if any clip cannot be probed.
pub fn probe_total_duration(ffprobe_binary: &Path, clips: &[PathBuf]) -> Option<f64> {
    clips.iter().try_fold(0.0_f64, |total, clip| {
        let duration = probe_media_duration_seconds(ffprobe_binary, clip);
        if duration.is_none() {
            debug!("could not probe duration of {}", clip.display());
        }
        duration.map(|value| total + value)
    })
}
