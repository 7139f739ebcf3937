// Persisted mixer settings and the eligible-extension allow-list.
use super::*;
use std::collections::BTreeSet;

pub const APP_DIR_NAME: &str = "video-mixer";
pub const SETTINGS_FILE_NAME: &str = "mixer-settings.json";
pub const DEFAULT_VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];
pub const DEFAULT_OUTPUT_EXTENSION: &str = "mp4";

/// The set of container extensions treated as eligible clips.
///
/// Scanner and pipeline share one instance so they never disagree about what counts
/// as a video. Extensions are stored lowercase without the leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFilter {
    extensions: BTreeSet<String>,
}

impl MediaFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions: BTreeSet<String> = extensions
            .into_iter()
            .filter_map(|value| normalize_extension(value.as_ref()))
            .collect();
        if extensions.is_empty() {
            return Self::default();
        }
        Self { extensions }
    }

    pub fn is_eligible(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|value| value.to_str())
            .map(|value| value.to_lowercase())
            .map(|value| self.extensions.contains(&value))
            .unwrap_or(false)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|value| value.to_string())
                .collect(),
        }
    }
}

pub(super) fn normalize_extension(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_start_matches('.').to_lowercase();
    if trimmed.is_empty() || trimmed.len() > 8 {
        return None;
    }
    if !trimmed.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return None;
    }
    Some(trimmed)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MixerSettings {
    pub ffmpeg_custom_path: Option<String>,
    pub ffprobe_custom_path: Option<String>,
    pub output_dir: Option<String>,
    pub video_extensions: Vec<String>,
    pub output_extension: String,
    pub keep_partial_output: bool,
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self {
            ffmpeg_custom_path: None,
            ffprobe_custom_path: None,
            output_dir: None,
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|value| value.to_string())
                .collect(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            keep_partial_output: false,
        }
    }
}

impl MixerSettings {
    pub fn media_filter(&self) -> MediaFilter {
        MediaFilter::new(&self.video_extensions)
    }

    /// Destination for mixed files: the configured override or the desktop default.
    pub fn resolve_output_dir(&self) -> Result<PathBuf> {
        match self.output_dir.as_ref() {
            Some(custom) => Ok(PathBuf::from(custom)),
            None => default_output_dir(),
        }
    }
}

pub(super) fn sanitize_optional_path(value: Option<String>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if trimmed.len() > 1024 {
                return Err(MixerError::settings("Path is too long."));
            }
            if trimmed.chars().any(|ch| ch.is_control()) {
                return Err(MixerError::settings(
                    "Path contains invalid control characters.",
                ));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

pub fn normalize_settings(mut settings: MixerSettings) -> Result<MixerSettings> {
    settings.ffmpeg_custom_path = sanitize_optional_path(settings.ffmpeg_custom_path)?;
    settings.ffprobe_custom_path = sanitize_optional_path(settings.ffprobe_custom_path)?;
    settings.output_dir = sanitize_optional_path(settings.output_dir)?;
    settings.video_extensions = settings.media_filter().extensions().map(String::from).collect();
    settings.output_extension = normalize_extension(&settings.output_extension)
        .unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string());
    Ok(settings)
}

pub fn app_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| MixerError::settings("Failed to resolve the user config directory."))?;
    let path = base.join(APP_DIR_NAME);
    fs::create_dir_all(&path)
        .map_err(|error| MixerError::filesystem("Failed to create config dir", error))?;
    Ok(path)
}

pub fn settings_file_path() -> Result<PathBuf> {
    Ok(app_config_dir()?.join(SETTINGS_FILE_NAME))
}

pub fn load_settings_from(path: &Path) -> Result<MixerSettings> {
    if !path.exists() {
        return Ok(MixerSettings::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|error| MixerError::filesystem("Failed to read settings", error))?;
    let parsed: MixerSettings = serde_json::from_str(&raw)
        .map_err(|error| MixerError::settings(format!("Failed to parse settings: {error}")))?;
    normalize_settings(parsed)
}

pub fn save_settings_to(path: &Path, settings: MixerSettings) -> Result<MixerSettings> {
    let normalized = normalize_settings(settings)?;
    let payload = serde_json::to_string_pretty(&normalized)
        .map_err(|error| MixerError::settings(format!("Failed to serialize settings: {error}")))?;
    fs::write(path, payload)
        .map_err(|error| MixerError::filesystem("Failed to save settings", error))?;
    debug!("saved mixer settings to {}", path.display());
    Ok(normalized)
}

pub fn load_settings() -> Result<MixerSettings> {
    load_settings_from(&settings_file_path()?)
}

pub fn save_settings(settings: MixerSettings) -> Result<MixerSettings> {
    save_settings_to(&settings_file_path()?, settings)
}
