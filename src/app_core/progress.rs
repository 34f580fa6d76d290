//! Progress bookkeeping for blocking work shown in the progress modal.

/// Byte counters reported while a download runs.
#[derive(Debug, Clone, Copy)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

impl DownloadProgress {
    pub fn ratio(&self) -> f64 {
        progress_ratio(self.downloaded, self.total)
    }
}

#[derive(Debug, Clone)]
pub struct ProgressStage {
    pub label: String,
    pub ratio: f64,
    pub done: bool,
}

/// Converts a download progress value into a `[0.0, 1.0]` ratio.
///
/// When total size is unknown, uses a hyperbolic curve that approaches 1.0
/// as `downloaded` grows.
pub fn progress_ratio(downloaded: u64, total: Option<u64>) -> f64 {
    if let Some(t) = total
        && t > 0
    {
        return (downloaded as f64 / t as f64).min(1.0);
    }

    let d = downloaded as f64;
    d / (d + 1_000_000.0)
}
