// Progress events parsed from FFmpeg's `-progress` key=value stream.
use super::*;

pub const INITIAL_TIMEMARK: &str = "00:00:00.00";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub percent: u8,
    pub timemark: String,
}

/// Receives progress for one in-flight job. Injected per request.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreProgress;

impl ProgressObserver for IgnoreProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Folds `-progress pipe:1` output into [`ProgressEvent`]s.
///
/// FFmpeg writes one block per update:
/// ```text
/// out_time_us=1500000
/// out_time=00:00:01.500000
/// progress=continue
/// ```
/// An event is produced at every `progress=` line. Percent never decreases and only
/// reaches 100 on `progress=end` or through [`ProgressTracker::finish`].
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    expected_duration: Option<f64>,
    out_time_seconds: f64,
    timemark: String,
    last_percent: u8,
}

impl ProgressTracker {
    pub fn new(expected_duration: Option<f64>) -> Self {
        Self {
            expected_duration: expected_duration.filter(|value| value.is_finite() && *value > 0.0),
            out_time_seconds: 0.0,
            timemark: INITIAL_TIMEMARK.to_string(),
            last_percent: 0,
        }
    }

    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    /// Closing event for a job that succeeded without FFmpeg printing `progress=end`.
    /// Returns `None` once 100 has already been reported.
    pub fn finish(&mut self) -> Option<ProgressEvent> {
        if self.last_percent >= 100 {
            return None;
        }
        Some(self.snapshot(true))
    }

    pub fn ingest_line(&mut self, line: &str) -> Option<ProgressEvent> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();
        match key.trim() {
            // out_time_ms is microseconds too.
            "out_time_us" | "out_time_ms" => {
                if let Ok(micros) = value.parse::<i64>() {
                    if micros >= 0 {
                        self.out_time_seconds = micros as f64 / 1_000_000.0;
                    }
                }
                None
            }
            "out_time" => {
                if let Some(timemark) = normalize_timemark(value) {
                    self.timemark = timemark;
                }
                None
            }
            "progress" => {
                let finished = value == "end";
                Some(self.snapshot(finished))
            }
            _ => None,
        }
    }

    fn snapshot(&mut self, finished: bool) -> ProgressEvent {
        let percent = if finished {
            100
        } else {
            self.expected_duration
                .map(|total| (self.out_time_seconds * 100.0 / total).floor().clamp(0.0, 99.0) as u8)
                .unwrap_or(0)
        };
        self.last_percent = self.last_percent.max(percent);
        ProgressEvent {
            percent: self.last_percent,
            timemark: self.timemark.clone(),
        }
    }
}

/// `HH:MM:SS.micros` to `HH:MM:SS.cc`. Negative or `N/A` marks are rejected.
pub(super) fn normalize_timemark(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return None;
    }
    let (clock, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() != 3
        || parts
            .iter()
            .any(|part| part.is_empty() || !part.chars().all(|ch| ch.is_ascii_digit()))
    {
        return None;
    }
    if !fraction.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let centis: String = fraction.chars().chain("00".chars()).take(2).collect();
    Some(format!("{clock}.{centis}"))
}
