//! Mediator API
//!
//! The mediator accepts job submissions, reports their status and output, and
//! fronts the face-recognition read API used to inspect finished results.
//! [`MediatorApi`] is the seam the pipeline talks to; [`MediatorClient`] is the
//! HTTP implementation.

pub mod client;

pub use client::MediatorClient;

use async_trait::async_trait;

use crate::models::{
    ClusterCollection, Face, FaceExtractionCollection, JobMediatorInput, MediatorJob, Token,
};
use crate::types::AppResult;

#[async_trait]
pub trait MediatorApi: Send + Sync {
    /// Fetch a fresh access token; later calls carry it as `Authorization`
    async fn authenticate(&self) -> AppResult<Token>;

    async fn create_job(&self, input: &JobMediatorInput) -> AppResult<MediatorJob>;

    async fn get_job_by_id(&self, job_id: &str) -> AppResult<MediatorJob>;

    async fn get_face_extraction_collection(
        &self,
        project_service_id: &str,
        face_extraction_id: &str,
    ) -> AppResult<FaceExtractionCollection>;

    async fn get_face(&self, project_service_id: &str, face_id: &str) -> AppResult<Face>;

    async fn get_cluster_collection(
        &self,
        project_service_id: &str,
        cluster_collection_id: &str,
    ) -> AppResult<ClusterCollection>;
}
