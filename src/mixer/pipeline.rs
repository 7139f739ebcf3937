// End-to-end mixing request: resolve folders, draw clips, place output, run the job.
use super::*;
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixRequest {
    pub folders: Vec<FolderDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixOutcome {
    pub output_path: PathBuf,
    /// Clips in the order they were concatenated.
    pub clips: Vec<PathBuf>,
    pub folder_count: usize,
}

/// Resolved configuration for mixing requests.
///
/// A `VideoMixer` holds no per-request state, so one instance can serve several
/// requests at once; each request gets its own manifest and output name.
#[derive(Debug, Clone)]
pub struct VideoMixer {
    ffmpeg_binary: PathBuf,
    ffprobe_binary: Option<PathBuf>,
    filter: MediaFilter,
    output_dir: PathBuf,
    manifest_dir: PathBuf,
    output_extension: String,
    keep_partial_output: bool,
}

impl VideoMixer {
    pub fn new(ffmpeg_binary: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_binary: ffmpeg_binary.into(),
            ffprobe_binary: None,
            filter: MediaFilter::default(),
            output_dir: output_dir.into(),
            manifest_dir: default_manifest_dir(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            keep_partial_output: false,
        }
    }

    /// Resolves tools and destination from persisted settings. Fails with
    /// [`MixerError::ToolNotFound`] when FFmpeg is unavailable.
    pub fn from_settings(settings: &MixerSettings) -> Result<Self> {
        let ffmpeg_binary = resolve_ffmpeg_binary(settings)?;
        let mixer = Self::new(ffmpeg_binary, settings.resolve_output_dir()?)
            .with_ffprobe(resolve_ffprobe_binary(settings))
            .with_media_filter(settings.media_filter())
            .with_output_extension(&settings.output_extension)
            .keep_partial_output(settings.keep_partial_output);
        Ok(mixer)
    }

    pub fn with_ffprobe(mut self, ffprobe_binary: Option<PathBuf>) -> Self {
        self.ffprobe_binary = ffprobe_binary;
        self
    }

    pub fn with_media_filter(mut self, filter: MediaFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_manifest_dir(mut self, manifest_dir: impl Into<PathBuf>) -> Self {
        self.manifest_dir = manifest_dir.into();
        self
    }

    pub fn with_output_extension(mut self, extension: &str) -> Self {
        self.output_extension =
            normalize_extension(extension).unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string());
        self
    }

    pub fn keep_partial_output(mut self, keep: bool) -> Self {
        self.keep_partial_output = keep;
        self
    }

    pub fn scan(&self, root: &Path) -> Result<Vec<FolderDescriptor>> {
        scan_source_root(root, &self.filter)
    }

    pub fn mix(&self, request: &MixRequest, observer: &dyn ProgressObserver) -> Result<MixOutcome> {
        self.mix_with_rng(request, observer, &mut rand::thread_rng())
    }

    /// Same as [`VideoMixer::mix`] with an explicit random source.
    ///
    /// Nothing is written before a non-empty selection exists, so a request without any
    /// eligible clip leaves the filesystem untouched.
    pub fn mix_with_rng<R>(
        &self,
        request: &MixRequest,
        observer: &dyn ProgressObserver,
        rng: &mut R,
    ) -> Result<MixOutcome>
    where
        R: Rng + ?Sized,
    {
        info!("mix requested for {} folder(s)", request.folders.len());
        let folders = resolve_source_folders(&request.folders, &self.filter)?;
        let selection = select_clips(&folders, rng)?;
        debug!("selected {} clip(s): {:?}", selection.len(), selection.clips());

        let output_dir = prepare_output_dir(&self.output_dir)?;
        let manifest = Manifest::write(&selection, &self.manifest_dir)?;
        let output_path =
            reserve_output_file(&output_dir, timestamp_millis(), &self.output_extension)?;
        let expected_duration = self
            .ffprobe_binary
            .as_deref()
            .and_then(|ffprobe| probe_total_duration(ffprobe, selection.clips()));

        let output_path = ConcatJob::new(&self.ffmpeg_binary, manifest, output_path)
            .with_expected_duration(expected_duration)
            .keep_partial_output(self.keep_partial_output)
            .run(observer)?;

        Ok(MixOutcome {
            output_path,
            folder_count: request.folders.len(),
            clips: selection.into_clips(),
        })
    }
}
