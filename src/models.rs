// Mediator and face-recognition API payloads
//
// Field names follow the mediator's camelCase JSON. Nothing here is persisted;
// every value lives for a single pipeline stage.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{AppError, AppResult};

pub const FACE_RECOGNITION_JOB_TYPE: &str = "FaceRecognitionJob";

/// A storage object plus a signed URL granting access to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locator {
    pub bucket: String,
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Effort {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobProfile {
    ExtractFaces,
    ClusterFaces,
    SearchFaces,
}

impl std::fmt::Display for JobProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobProfile::ExtractFaces => write!(f, "ExtractFaces"),
            JobProfile::ClusterFaces => write!(f, "ClusterFaces"),
            JobProfile::SearchFaces => write!(f, "SearchFaces"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractFacesInput {
    pub video: Locator,
    pub effort: Effort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterFacesInput {
    pub face_extraction_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFacesInput {
    pub input_image: Locator,
    pub cluster_collection_id: String,
    pub similarity_threshold: f64,
}

/// Profile-specific job input. The profile itself travels in `Job::job_profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobInput {
    ExtractFaces(ExtractFacesInput),
    SearchFaces(SearchFacesInput),
    ClusterFaces(ClusterFacesInput),
}

impl JobInput {
    pub fn profile(&self) -> JobProfile {
        match self {
            JobInput::ExtractFaces(_) => JobProfile::ExtractFaces,
            JobInput::ClusterFaces(_) => JobProfile::ClusterFaces,
            JobInput::SearchFaces(_) => JobProfile::SearchFaces,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_type: String,
    pub job_profile: JobProfile,
    pub job_input: JobInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMediatorInput {
    pub project_service_id: String,
    pub quantity: u32,
    pub job: Job,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Queued,
    Running,
    InProgress,
    Completed,
    Failed,
    #[serde(other)]
    Other,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMediatorStatus {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

/// The mediator's view of a submitted job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediatorJob {
    pub id: String,
    pub status: JobMediatorStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MediatorJob {
    pub fn state(&self) -> JobStatus {
        self.status.status
    }

    /// Decode the profile-specific output of a completed job
    pub fn output<T: DeserializeOwned>(&self) -> AppResult<T> {
        let value = self.job_output.clone().ok_or_else(|| AppError::MissingOutput {
            job_id: self.id.clone(),
            field: "jobOutput",
        })?;
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractFacesOutput {
    #[serde(default)]
    pub face_extraction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterFacesOutput {
    #[serde(default)]
    pub cluster_collection_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default)]
    pub similarity: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchFacesOutput {
    #[serde(default)]
    pub matches: Vec<FaceMatch>,
}

/// Authorization credential for mediator calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub authorization: String,
    /// Lifetime in seconds, when the server reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceExtractionCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub face_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub cluster_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_status_is_not_terminal() {
        let status: JobMediatorStatus =
            serde_json::from_value(json!({"status": "SCHEDULING"})).unwrap();
        assert_eq!(status.status, JobStatus::Other);
        assert!(!status.status.is_terminal());
    }

    #[test]
    fn test_mediator_job_output_decoding() {
        let job: MediatorJob = serde_json::from_value(json!({
            "id": "job-1",
            "status": {"status": "COMPLETED"},
            "jobOutput": {"faceExtractionId": "ext-1"},
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(job.state(), JobStatus::Completed);
        assert!(job.created_at.is_some());
        let output: ExtractFacesOutput = job.output().unwrap();
        assert_eq!(output.face_extraction_id.as_deref(), Some("ext-1"));
    }

    #[test]
    fn test_missing_output_is_reported() {
        let job: MediatorJob = serde_json::from_value(json!({
            "id": "job-2",
            "status": {"status": "COMPLETED"}
        }))
        .unwrap();

        let err = job.output::<ClusterFacesOutput>().unwrap_err();
        assert!(matches!(err, AppError::MissingOutput { .. }));
    }

    #[test]
    fn test_job_wire_format() {
        let job = Job {
            job_type: FACE_RECOGNITION_JOB_TYPE.to_string(),
            job_profile: JobProfile::ClusterFaces,
            job_input: JobInput::ClusterFaces(ClusterFacesInput {
                face_extraction_id: "ext-1".to_string(),
            }),
        };

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(
            value,
            json!({
                "jobType": "FaceRecognitionJob",
                "jobProfile": "ClusterFaces",
                "jobInput": {"faceExtractionId": "ext-1"}
            })
        );

        let parsed: Job = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.job_input.profile(), JobProfile::ClusterFaces);
    }

    #[test]
    fn test_search_matches_keep_extra_fields() {
        let output: SearchFacesOutput = serde_json::from_value(json!({
            "matches": [{"faceId": "f-1", "similarity": 0.93, "boundingBox": [1, 2, 3, 4]}]
        }))
        .unwrap();

        assert_eq!(output.matches.len(), 1);
        assert_eq!(output.matches[0].face_id.as_deref(), Some("f-1"));
        assert!(output.matches[0].extra.contains_key("boundingBox"));
    }
}
