//! Pipeline driver
//!
//! Runs the three face-recognition stages in order, threading each stage's
//! output identifier into the next submission:
//!
//! 1. upload the video, submit `ExtractFaces`, read `faceExtractionId`
//! 2. submit `ClusterFaces` for that extraction, read `clusterCollectionId`
//! 3. upload the probe image, submit `SearchFaces` against the collection
//!
//! Any error aborts the run. Uploaded artifacts are left in the bucket unless
//! `cleanup_artifacts` is set.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Config, PipelineSettings};
use crate::jobs::{
    cluster_faces_job, extract_faces_job, mediator_input, search_faces_job, wait_for_complete,
    PollSettings,
};
use crate::mediator::MediatorApi;
use crate::models::{
    ClusterFacesOutput, ExtractFacesOutput, JobMediatorInput, MediatorJob, SearchFacesOutput,
};
use crate::storage::Storage;
use crate::types::{AppError, AppResult};

/// What a completed run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub extract_job_id: String,
    pub face_extraction_id: String,
    pub face_count: usize,
    pub cluster_job_id: String,
    pub cluster_collection_id: String,
    pub cluster_count: usize,
    pub search_job_id: String,
    pub search: SearchFacesOutput,
}

struct Media {
    path: PathBuf,
    key: String,
}

pub struct Pipeline {
    storage: Storage,
    mediator: Arc<dyn MediatorApi>,
    project_service_id: String,
    settings: PipelineSettings,
    poll: PollSettings,
    video: Media,
    image: Media,
}

impl Pipeline {
    pub fn new(config: &Config, storage: Storage, mediator: Arc<dyn MediatorApi>) -> Self {
        Self {
            storage,
            mediator,
            project_service_id: config.project_service_id.clone(),
            settings: config.pipeline.clone(),
            poll: PollSettings::from(&config.pipeline),
            video: Media {
                path: config.video_path(),
                key: config.video_key().to_string(),
            },
            image: Media {
                path: config.image_path(),
                key: config.image_key().to_string(),
            },
        }
    }

    pub async fn run(&self) -> AppResult<PipelineReport> {
        let mut uploaded = Vec::new();
        let result = self.run_stages(&mut uploaded).await;

        if self.settings.cleanup_artifacts {
            self.delete_artifacts(&uploaded).await;
        }
        result
    }

    async fn run_stages(&self, uploaded: &mut Vec<String>) -> AppResult<PipelineReport> {
        self.storage.upload(&self.video.path, &self.video.key).await?;
        uploaded.push(self.video.key.clone());
        let video = self.storage.input_locator(&self.video.key).await?;
        debug!(url = %video.url, "Signed video input");

        self.mediator.authenticate().await?;

        // Extract
        let input = mediator_input(
            &self.project_service_id,
            self.settings.quantity,
            extract_faces_job(video, self.settings.effort)?,
        );
        let extract_job = self.submit_and_wait(&input).await?;
        let face_extraction_id = extract_job
            .output::<ExtractFacesOutput>()?
            .face_extraction_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::MissingOutput {
                job_id: extract_job.id.clone(),
                field: "faceExtractionId",
            })?;
        info!(%face_extraction_id, "Faces extracted");

        let extraction = self
            .mediator
            .get_face_extraction_collection(&self.project_service_id, &face_extraction_id)
            .await?;
        info!(faces = extraction.face_ids.len(), "Queried face extraction");
        match extraction.face_ids.first() {
            Some(face_id) => {
                let face = self.mediator.get_face(&self.project_service_id, face_id).await?;
                debug!(?face, "First extracted face");
            }
            None => warn!(%face_extraction_id, "Face extraction contains no faces"),
        }

        // Cluster
        let input = mediator_input(
            &self.project_service_id,
            self.settings.quantity,
            cluster_faces_job(&face_extraction_id)?,
        );
        let cluster_job = self.submit_and_wait(&input).await?;
        let cluster_collection_id = cluster_job
            .output::<ClusterFacesOutput>()?
            .cluster_collection_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::MissingOutput {
                job_id: cluster_job.id.clone(),
                field: "clusterCollectionId",
            })?;
        info!(%cluster_collection_id, "Faces clustered");

        let clusters = self
            .mediator
            .get_cluster_collection(&self.project_service_id, &cluster_collection_id)
            .await?;
        info!(clusters = clusters.cluster_ids.len(), "Queried cluster collection");

        // Search
        self.storage.upload(&self.image.path, &self.image.key).await?;
        uploaded.push(self.image.key.clone());
        let image = self.storage.input_locator(&self.image.key).await?;
        debug!(url = %image.url, "Signed image input");

        let input = mediator_input(
            &self.project_service_id,
            self.settings.quantity,
            search_faces_job(image, &cluster_collection_id, self.settings.similarity_threshold)?,
        );
        let search_job = self.submit_and_wait(&input).await?;
        let search: SearchFacesOutput = search_job.output()?;
        info!(matches = search.matches.len(), "Face search finished");

        Ok(PipelineReport {
            extract_job_id: extract_job.id,
            face_extraction_id,
            face_count: extraction.face_ids.len(),
            cluster_job_id: cluster_job.id,
            cluster_collection_id,
            cluster_count: clusters.cluster_ids.len(),
            search_job_id: search_job.id,
            search,
        })
    }

    async fn submit_and_wait(&self, input: &JobMediatorInput) -> AppResult<MediatorJob> {
        let profile = input.job.job_profile;
        let payload = serde_json::to_string(input)?;
        debug!(%payload, "Job mediator input");
        info!(%profile, "Submitting job");

        let job = self.mediator.create_job(input).await?;
        info!(%profile, job_id = %job.id, status = ?job.state(), "Job submitted");

        wait_for_complete(self.mediator.as_ref(), job, &self.poll).await
    }

    async fn delete_artifacts(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.storage.delete(key).await {
                warn!(key = %key, error = %e, "Failed to delete storage artifact");
            }
        }
    }
}
