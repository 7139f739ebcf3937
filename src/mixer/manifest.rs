// Concat demuxer list file, owned by exactly one job.
use super::*;
use tempfile::NamedTempFile;

pub const MANIFEST_PREFIX: &str = "mix-manifest-";
pub const MANIFEST_SUFFIX: &str = ".txt";

/// Manifests go straight into the system temp dir; `tempfile` makes each name unique
/// and owner-only.
pub fn default_manifest_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Quotes a path for a concat demuxer `file` directive.
///
/// Inside single quotes everything is literal, so an embedded `'` closes the quote,
/// emits an escaped quote and reopens.
pub fn escape_concat_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("'{}'", raw.replace('\'', "'\\''"))
}

pub fn render_manifest_line(path: &Path) -> String {
    format!("file {}", escape_concat_path(path))
}

pub fn render_manifest(clips: &[PathBuf]) -> String {
    let mut content = String::new();
    for clip in clips {
        content.push_str(&render_manifest_line(clip));
        content.push('\n');
    }
    content
}

fn unquote_concat_token(token: &str) -> String {
    let mut value = String::with_capacity(token.len());
    let mut quoted = false;
    let mut chars = token.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' => quoted = !quoted,
            '\\' if !quoted => {
                if let Some(next) = chars.next() {
                    value.push(next);
                }
            }
            _ => value.push(ch),
        }
    }
    value
}

/// Reads `file` directives back into paths, in file order. Other directives and blank
/// lines are ignored.
pub fn parse_manifest(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("file "))
        .map(|token| PathBuf::from(unquote_concat_token(token.trim())))
        .collect()
}

/// The list file handed to FFmpeg. Dropping it deletes the file.
#[derive(Debug)]
pub struct Manifest {
    file: NamedTempFile,
    entries: usize,
}

impl Manifest {
    /// Writes `selection` into a uniquely named file under `dir`, creating `dir` if needed.
    pub fn write(selection: &Selection, dir: &Path) -> Result<Self> {
        let context = || format!("Failed to write concat manifest in {}", dir.display());
        fs::create_dir_all(dir).map_err(|error| MixerError::filesystem(context(), error))?;
        let mut file = tempfile::Builder::new()
            .prefix(MANIFEST_PREFIX)
            .suffix(MANIFEST_SUFFIX)
            .tempfile_in(dir)
            .map_err(|error| MixerError::filesystem(context(), error))?;
        file.write_all(render_manifest(selection.clips()).as_bytes())
            .and_then(|_| file.flush())
            .map_err(|error| MixerError::filesystem(context(), error))?;
        debug!(
            "wrote manifest {} with {} entr(ies)",
            file.path().display(),
            selection.len()
        );
        Ok(Self {
            file,
            entries: selection.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Deletes the manifest now, reporting a failed removal instead of ignoring it.
    pub fn remove(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close().map_err(|error| {
            MixerError::filesystem(
                format!("Failed to remove manifest {}", path.display()),
                error,
            )
        })
    }
}
