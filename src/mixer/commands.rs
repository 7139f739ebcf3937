// Public Tauri commands exported to the desktop frontend.
use super::*;
use tauri::{AppHandle, Emitter};

pub const MIX_PROGRESS_EVENT: &str = "mixer://progress";

/// Forwards job progress to the frontend window.
struct WindowProgress {
    app: AppHandle,
}

impl ProgressObserver for WindowProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        let _ = self.app.emit(MIX_PROGRESS_EVENT, event);
    }
}

fn background_failure(error: impl std::fmt::Display) -> MixerError {
    MixerError::mixing_job(format!("Background task failed: {error}"))
}

fn open_in_file_manager(path: &Path) -> Result<()> {
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = hidden_command("explorer");
        command.arg(path);
        command
    };

    #[cfg(target_os = "macos")]
    let mut command = {
        let mut command = hidden_command("open");
        command.arg(path);
        command
    };

    #[cfg(all(unix, not(target_os = "macos")))]
    let mut command = {
        let mut command = hidden_command("xdg-open");
        command.arg(path);
        command
    };

    command
        .spawn()
        .map_err(|error| MixerError::filesystem("Failed to open folder", error))?;
    Ok(())
}

#[tauri::command]
pub fn pick_source_root() -> Result<Option<String>, MixerError> {
    Ok(rfd::FileDialog::new()
        .pick_folder()
        .map(|path| path.to_string_lossy().to_string()))
}

#[tauri::command]
pub fn get_mixer_settings() -> Result<MixerSettings, MixerError> {
    load_settings()
}

#[tauri::command]
pub fn save_mixer_settings(settings: MixerSettings) -> Result<MixerSettings, MixerError> {
    save_settings(settings)
}

#[tauri::command]
pub async fn get_tool_status() -> Result<ToolsStatus, MixerError> {
    let settings = load_settings()?;
    tauri::async_runtime::spawn_blocking(move || tool_status(&settings))
        .await
        .map_err(background_failure)
}

#[tauri::command]
pub async fn scan_source_folders(root: String) -> Result<Vec<FolderDescriptor>, MixerError> {
    let trimmed = root.trim().to_string();
    if trimmed.is_empty() {
        return Err(MixerError::filesystem(
            "Source folder is missing",
            io::Error::new(io::ErrorKind::InvalidInput, "empty path"),
        ));
    }
    let filter = load_settings()?.media_filter();
    tauri::async_runtime::spawn_blocking(move || scan_source_root(Path::new(&trimmed), &filter))
        .await
        .map_err(background_failure)?
}

#[tauri::command]
pub async fn mix_videos(
    app: AppHandle,
    folders: Vec<FolderDescriptor>,
) -> Result<MixOutcome, MixerError> {
    let settings = load_settings()?;
    let mixer = VideoMixer::from_settings(&settings)?;
    tauri::async_runtime::spawn_blocking(move || {
        let observer = WindowProgress { app };
        mixer.mix(&MixRequest { folders }, &observer)
    })
    .await
    .map_err(background_failure)?
}

#[tauri::command]
pub fn open_output_dir() -> Result<String, MixerError> {
    let output_dir = prepare_output_dir(&load_settings()?.resolve_output_dir()?)?;
    open_in_file_manager(&output_dir)?;
    Ok(output_dir.to_string_lossy().to_string())
}
