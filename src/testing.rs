// In-memory fakes of the storage and mediator seams, for tests

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::mediator::MediatorApi;
use crate::models::{
    ClusterCollection, Face, FaceExtractionCollection, JobMediatorInput, JobMediatorStatus,
    JobProfile, JobStatus, MediatorJob, Token,
};
use crate::storage::ObjectStore;
use crate::types::{AppError, AppResult, UrlMode};

pub fn job_with_status(id: &str, status: JobStatus) -> MediatorJob {
    MediatorJob {
        id: id.to_string(),
        status: JobMediatorStatus {
            status,
            status_message: None,
        },
        job_output: None,
        job: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn completed_job(id: &str, output: serde_json::Value) -> MediatorJob {
    MediatorJob {
        job_output: Some(output),
        ..job_with_status(id, JobStatus::Completed)
    }
}

pub fn failed_job(id: &str, message: &str) -> MediatorJob {
    let mut job = job_with_status(id, JobStatus::Failed);
    job.status.status_message = Some(message.to_string());
    job
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    pub bucket: String,
    pub key: String,
    pub expiry: Duration,
    pub mode: UrlMode,
}

#[derive(Default)]
pub struct FakeObjectStore {
    uploads: Mutex<Vec<(PathBuf, String)>>,
    signed: Mutex<Vec<SignedRequest>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeObjectStore {
    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn signed(&self) -> Vec<SignedRequest> {
        self.signed.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn upload_file(&self, local_path: &Path, _bucket: &str, key: &str) -> AppResult<()> {
        tokio::fs::metadata(local_path)
            .await
            .map_err(|e| AppError::io(local_path, e))?;
        self.uploads
            .lock()
            .unwrap()
            .push((local_path.to_path_buf(), key.to_string()));
        Ok(())
    }

    async fn download_file(&self, _bucket: &str, key: &str, local_path: &Path) -> AppResult<()> {
        tokio::fs::write(local_path, key.as_bytes())
            .await
            .map_err(|e| AppError::io(local_path, e))
    }

    async fn delete_object(&self, _bucket: &str, key: &str) -> AppResult<()> {
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn signed_url(&self, bucket: &str, key: &str, expiry: Duration, mode: UrlMode) -> AppResult<String> {
        self.signed.lock().unwrap().push(SignedRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            expiry,
            mode,
        });
        Ok(format!(
            "https://storage.test/{}/{}?method={}&expires={}",
            bucket,
            key,
            mode,
            expiry.as_secs()
        ))
    }
}

/// Mediator that answers each submission with a canned job per profile and
/// serves status fetches from a script
#[derive(Default)]
pub struct FakeMediator {
    on_submit: HashMap<JobProfile, MediatorJob>,
    polls: Mutex<VecDeque<AppResult<MediatorJob>>>,
    submitted: Mutex<Vec<JobMediatorInput>>,
    face_ids: Vec<String>,
    queries: Mutex<Vec<String>>,
    fetches: AtomicUsize,
    authentications: AtomicUsize,
}

impl FakeMediator {
    pub fn on_submit(mut self, profile: JobProfile, job: MediatorJob) -> Self {
        self.on_submit.insert(profile, job);
        self
    }

    pub fn with_polls(self, polls: Vec<AppResult<MediatorJob>>) -> Self {
        *self.polls.lock().unwrap() = polls.into();
        self
    }

    pub fn with_face_ids(mut self, ids: &[&str]) -> Self {
        self.face_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn submitted(&self) -> Vec<JobMediatorInput> {
        self.submitted.lock().unwrap().clone()
    }

    /// Face API calls as `kind:id`
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn authentications(&self) -> usize {
        self.authentications.load(Ordering::SeqCst)
    }

    fn record_query(&self, kind: &str, id: &str) {
        self.queries.lock().unwrap().push(format!("{}:{}", kind, id));
    }
}

#[async_trait]
impl MediatorApi for FakeMediator {
    async fn authenticate(&self) -> AppResult<Token> {
        self.authentications.fetch_add(1, Ordering::SeqCst);
        Ok(Token {
            authorization: "Bearer test-token".to_string(),
            expires_in: None,
        })
    }

    async fn create_job(&self, input: &JobMediatorInput) -> AppResult<MediatorJob> {
        self.submitted.lock().unwrap().push(input.clone());
        self.on_submit
            .get(&input.job.job_profile)
            .cloned()
            .ok_or_else(|| AppError::Api {
                status: 400,
                message: format!("no canned response for {}", input.job.job_profile),
            })
    }

    async fn get_job_by_id(&self, job_id: &str) -> AppResult<MediatorJob> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(AppError::Api {
                    status: 404,
                    message: format!("no scripted status for {}", job_id),
                })
            })
    }

    async fn get_face_extraction_collection(
        &self,
        _project_service_id: &str,
        face_extraction_id: &str,
    ) -> AppResult<FaceExtractionCollection> {
        self.record_query("extraction", face_extraction_id);
        Ok(FaceExtractionCollection {
            id: Some(face_extraction_id.to_string()),
            face_ids: self.face_ids.clone(),
            extra: Default::default(),
        })
    }

    async fn get_face(&self, _project_service_id: &str, face_id: &str) -> AppResult<Face> {
        self.record_query("face", face_id);
        Ok(Face {
            id: face_id.to_string(),
            extra: Default::default(),
        })
    }

    async fn get_cluster_collection(
        &self,
        _project_service_id: &str,
        cluster_collection_id: &str,
    ) -> AppResult<ClusterCollection> {
        self.record_query("clusters", cluster_collection_id);
        Ok(ClusterCollection {
            id: Some(cluster_collection_id.to_string()),
            cluster_ids: vec!["c-1".to_string()],
            extra: Default::default(),
        })
    }
}
