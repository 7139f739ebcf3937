// Destination directory and collision-free output naming.
use super::*;
use std::time::{SystemTime, UNIX_EPOCH};

pub const OUTPUT_DIR_NAME: &str = "VideoMixer_Output";
pub const OUTPUT_FILE_PREFIX: &str = "mixed";

/// `<desktop>/VideoMixer_Output`, falling back to the home directory on systems
/// without a desktop folder.
pub fn default_output_dir() -> Result<PathBuf> {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .map(|base| base.join(OUTPUT_DIR_NAME))
        .ok_or_else(|| {
            MixerError::filesystem(
                "Failed to resolve output directory",
                io::Error::new(io::ErrorKind::NotFound, "no desktop or home directory"),
            )
        })
}

pub fn prepare_output_dir(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|error| {
        MixerError::filesystem(
            format!("Failed to create output directory {}", dir.display()),
            error,
        )
    })?;
    Ok(dir.to_path_buf())
}

pub fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

/// `mixed_<timestamp>.<ext>` inside `dir`; an existing file gets a `-2`, `-3`, ... suffix
/// instead of being overwritten.
pub fn output_file_path(dir: &Path, timestamp: u128, ext: &str) -> PathBuf {
    let extension = normalize_extension(ext).unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string());
    let stem = format!("{OUTPUT_FILE_PREFIX}_{timestamp}");
    let candidate = dir.join(format!("{stem}.{extension}"));
    if !candidate.exists() {
        return candidate;
    }
    let mut index = 2_u32;
    loop {
        let next = dir.join(format!("{stem}-{index}.{extension}"));
        if !next.exists() {
            return next;
        }
        index += 1;
    }
}

/// Claims a fresh output name by creating it empty, so concurrent requests landing on the
/// same millisecond still get distinct files.
pub fn reserve_output_file(dir: &Path, timestamp: u128, ext: &str) -> Result<PathBuf> {
    loop {
        let candidate = output_file_path(dir, timestamp, ext);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(_) => return Ok(candidate),
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(error) => {
                return Err(MixerError::filesystem(
                    format!("Failed to create output file {}", candidate.display()),
                    error,
                ))
            }
        }
    }
}
