// Stream-copy concatenation job: runs FFmpeg against a manifest and owns its cleanup.
use super::*;
use std::collections::VecDeque;
use std::fmt::Display;
use std::process::{Child, ChildStderr};

const STDERR_TAIL_LINES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// One FFmpeg concat run. The job consumes its [`Manifest`], so the list file is gone
/// once [`ConcatJob::run`] returns, whichever way it returns.
#[derive(Debug)]
pub struct ConcatJob {
    ffmpeg_binary: PathBuf,
    manifest: Manifest,
    output_path: PathBuf,
    expected_duration: Option<f64>,
    keep_partial_output: bool,
    state: JobState,
}

impl ConcatJob {
    pub fn new(ffmpeg_binary: impl Into<PathBuf>, manifest: Manifest, output_path: PathBuf) -> Self {
        Self {
            ffmpeg_binary: ffmpeg_binary.into(),
            manifest,
            output_path,
            expected_duration: None,
            keep_partial_output: false,
            state: JobState::Pending,
        }
    }

    /// Total input duration in seconds, used to turn FFmpeg's output time into a percentage.
    pub fn with_expected_duration(mut self, seconds: Option<f64>) -> Self {
        self.expected_duration = seconds;
        self
    }

    pub fn keep_partial_output(mut self, keep: bool) -> Self {
        self.keep_partial_output = keep;
        self
    }

    fn transition(&mut self, next: JobState) {
        debug!("concat job {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn command(&self) -> std::process::Command {
        let mut command = hidden_command(&self.ffmpeg_binary);
        command
            .arg("-hide_banner")
            .arg("-nostdin")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-f")
            .arg("concat")
            .arg("-safe")
            .arg("0")
            .arg("-i")
            .arg(self.manifest.path())
            .arg("-c")
            .arg("copy")
            .arg("-progress")
            .arg("pipe:1")
            .arg("-nostats")
            .arg(&self.output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    /// Runs the job to a terminal state, forwarding progress to `observer`.
    ///
    /// The manifest is deleted on success and on failure. The output path belongs to the
    /// job (see [`reserve_output_file`]). On failure an empty output is always removed, and
    /// anything FFmpeg wrote there is removed unless `keep_partial_output` is set.
    pub fn run(mut self, observer: &dyn ProgressObserver) -> Result<PathBuf> {
        info!(
            "mixing {} clip(s) into {}",
            self.manifest.len(),
            self.output_path.display()
        );
        self.transition(JobState::Running);
        let outcome = self.execute(observer);
        self.transition(if outcome.is_ok() {
            JobState::Succeeded
        } else {
            JobState::Failed
        });

        let ConcatJob {
            manifest,
            output_path,
            keep_partial_output,
            ..
        } = self;
        if let Err(error) = manifest.remove() {
            warn!("{error}");
        }

        match outcome {
            Ok(()) => {
                info!("mix finished: {}", output_path.display());
                Ok(output_path)
            }
            Err(error) => {
                discard_failed_output(&output_path, keep_partial_output);
                Err(error)
            }
        }
    }

    fn execute(&self, observer: &dyn ProgressObserver) -> Result<()> {
        let mut command = self.command();
        debug!("spawning {command:?}");
        let mut child = command
            .spawn()
            .map_err(|error| MixerError::mixing_job(format!("Failed to start FFmpeg: {error}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MixerError::mixing_job("Failed to capture FFmpeg progress output."))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MixerError::mixing_job("Failed to capture FFmpeg diagnostics."))?;
        let stderr_handle = thread::spawn(move || collect_stderr_tail(stderr));

        let mut tracker = ProgressTracker::new(self.expected_duration);
        let mut reader = BufReader::new(stdout);
        let mut raw_buffer = Vec::<u8>::new();
        loop {
            match read_lossy_process_line(&mut reader, &mut raw_buffer) {
                Ok(Some(line)) => {
                    if let Some(event) = tracker.ingest_line(&line) {
                        observer.on_progress(&event);
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    stop_child(&mut child);
                    return Err(MixerError::mixing_job(format!(
                        "Failed to read FFmpeg progress stream: {error}"
                    )));
                }
            }
        }

        let status = child.wait().map_err(|error| {
            MixerError::mixing_job(format!("Failed while waiting for FFmpeg to finish: {error}"))
        })?;
        let tail = stderr_handle.join().unwrap_or_default();
        if !status.success() {
            return Err(MixerError::mixing_job(describe_failure(status, &tail)));
        }
        let written = fs::metadata(&self.output_path)
            .map(|metadata| metadata.is_file() && metadata.len() > 0)
            .unwrap_or(false);
        if !written {
            return Err(MixerError::mixing_job(
                "FFmpeg finished without writing the output file.",
            ));
        }
        if let Some(event) = tracker.finish() {
            debug!("FFmpeg exited without an end marker; closing progress at 100");
            observer.on_progress(&event);
        }
        Ok(())
    }
}

fn discard_failed_output(output_path: &Path, keep_partial_output: bool) {
    let Ok(metadata) = fs::metadata(output_path) else {
        return;
    };
    let has_content = metadata.len() > 0;
    if keep_partial_output && has_content {
        info!("keeping partial output {}", output_path.display());
        return;
    }
    if let Err(cleanup_error) = fs::remove_file(output_path) {
        warn!(
            "failed to remove partial output {}: {cleanup_error}",
            output_path.display()
        );
    }
}

fn stop_child(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn collect_stderr_tail(stderr: ChildStderr) -> Vec<String> {
    let mut reader = BufReader::new(stderr);
    let mut raw_buffer = Vec::<u8>::new();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
    while let Ok(Some(line)) = read_lossy_process_line(&mut reader, &mut raw_buffer) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(trimmed.to_string());
    }
    tail.into()
}

pub(super) fn describe_failure(status: impl Display, tail: &[String]) -> String {
    if tail.is_empty() {
        return format!("FFmpeg exited with {status}.");
    }
    format!("FFmpeg: {}", tail.join(" | "))
}
