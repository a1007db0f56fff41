//! Remote generation job and the status data returned for it

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Job status as classified from the provider's status string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Success,
    Failed,
    Expired,
}

impl JobStatus {
    /// Classify a provider status string (case-insensitive)
    ///
    /// Anything not recognized as terminal is still pending.
    pub fn from_api(raw: &str) -> Self {
        let status = raw.trim().to_ascii_uppercase();
        match status.as_str() {
            "SUCCESS" => JobStatus::Success,
            "EXPIRED" => JobStatus::Expired,
            "CREATE_TASK_FAILED" | "GENERATE_AUDIO_FAILED" => JobStatus::Failed,
            s if s.ends_with("FAILED") => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// One generated track from a status response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Track {
    pub audio_url: Option<String>,
    pub title: Option<String>,
    pub duration_seconds: Option<f64>,
    pub model_name: Option<String>,
}

impl Track {
    /// Non-empty audio locator, if any
    pub fn audio_locator(&self) -> Option<&str> {
        self.audio_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    pub fn metadata(&self) -> TrackMetadata {
        TrackMetadata {
            title: self.title.clone(),
            duration_seconds: self.duration_seconds,
            model_name: self.model_name.clone(),
        }
    }
}

/// Parsed result of one status query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Status string as reported (may be empty)
    pub status: String,
    pub tracks: Vec<Track>,
}

impl StatusSnapshot {
    pub fn new(status: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            status: status.into(),
            tracks,
        }
    }

    pub fn normalized_status(&self) -> String {
        self.status.trim().to_ascii_uppercase()
    }

    pub fn job_status(&self) -> JobStatus {
        JobStatus::from_api(&self.status)
    }
}

/// Descriptive data of the delivered track
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub duration_seconds: Option<f64>,
    pub model_name: Option<String>,
}

/// A submitted generation job
///
/// Only the polling engine mutates it, through [`GenerationJob::apply_snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationJob {
    pub job_id: String,
    pub status: JobStatus,
    /// Last status string reported by the provider (uppercased)
    pub raw_status: Option<String>,
    /// Set only on success when a returned track carries an audio locator
    pub result_asset_url: Option<String>,
    pub result_metadata: Option<TrackMetadata>,
    pub submitted_at: DateTime<Utc>,
}

impl GenerationJob {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            raw_status: None,
            result_asset_url: None,
            result_metadata: None,
            submitted_at: Utc::now(),
        }
    }

    /// Fold a status query result into the job
    ///
    /// Terminal statuses are never revisited: once the job left `Pending`
    /// further snapshots are ignored. Returns whether anything changed.
    pub fn apply_snapshot(&mut self, snapshot: &StatusSnapshot) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        let raw_status = snapshot.normalized_status();
        let status = snapshot.job_status();
        let changed = self.raw_status.as_deref() != Some(raw_status.as_str()) || status != self.status;

        self.raw_status = Some(raw_status);
        self.status = status;

        if status == JobStatus::Success {
            if let Some(track) = snapshot.tracks.iter().find(|t| t.audio_locator().is_some()) {
                self.result_asset_url = track.audio_locator().map(str::to_string);
                self.result_metadata = Some(track.metadata());
            }
        }

        changed
    }
}
