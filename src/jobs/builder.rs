// Pure constructors for the three face-recognition job payloads

use crate::models::{
    ClusterFacesInput, Effort, ExtractFacesInput, Job, JobInput, JobMediatorInput, Locator,
    SearchFacesInput, FACE_RECOGNITION_JOB_TYPE,
};
use crate::types::{AppError, AppResult};

fn require(name: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidRequest(format!("{} must not be empty", name)));
    }
    Ok(())
}

fn require_locator(name: &str, locator: &Locator) -> AppResult<()> {
    require(&format!("{} bucket", name), &locator.bucket)?;
    require(&format!("{} key", name), &locator.key)?;
    require(&format!("{} url", name), &locator.url)
}

fn job(job_input: JobInput) -> Job {
    Job {
        job_type: FACE_RECOGNITION_JOB_TYPE.to_string(),
        job_profile: job_input.profile(),
        job_input,
    }
}

pub fn extract_faces_job(video: Locator, effort: Effort) -> AppResult<Job> {
    require_locator("video", &video)?;
    Ok(job(JobInput::ExtractFaces(ExtractFacesInput { video, effort })))
}

pub fn cluster_faces_job(face_extraction_id: &str) -> AppResult<Job> {
    require("face_extraction_id", face_extraction_id)?;
    Ok(job(JobInput::ClusterFaces(ClusterFacesInput {
        face_extraction_id: face_extraction_id.to_string(),
    })))
}

pub fn search_faces_job(
    input_image: Locator,
    cluster_collection_id: &str,
    similarity_threshold: f64,
) -> AppResult<Job> {
    require_locator("input image", &input_image)?;
    require("cluster_collection_id", cluster_collection_id)?;
    if !(0.0..=1.0).contains(&similarity_threshold) {
        return Err(AppError::InvalidRequest(format!(
            "similarity threshold {} is outside [0, 1]",
            similarity_threshold
        )));
    }

    Ok(job(JobInput::SearchFaces(SearchFacesInput {
        input_image,
        cluster_collection_id: cluster_collection_id.to_string(),
        similarity_threshold,
    })))
}

/// Wrap a job with the project it is billed to and the resources it requests
pub fn mediator_input(project_service_id: &str, quantity: u32, job: Job) -> JobMediatorInput {
    JobMediatorInput {
        project_service_id: project_service_id.to_string(),
        quantity,
        job,
    }
}
