// Fixed-interval polling until a job reaches COMPLETED or FAILED

use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info};

use crate::config::PipelineSettings;
use crate::mediator::MediatorApi;
use crate::models::{JobStatus, MediatorJob};
use crate::types::{AppError, AppResult};
use crate::utils::with_retry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Upper bound on the total wait for one job
    pub timeout: Duration,
    /// Extra attempts for a status fetch that fails transiently
    pub fetch_retries: u32,
}

impl From<&PipelineSettings> for PollSettings {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            timeout: settings.job_timeout(),
            fetch_retries: settings.poll_fetch_retries,
        }
    }
}

/// Poll `job` until it is terminal.
///
/// A job that is already terminal is returned without fetching. FAILED becomes
/// [`AppError::JobFailed`] carrying the server's status message, and a job still
/// running after `timeout` becomes [`AppError::JobTimeout`].
pub async fn wait_for_complete(
    api: &dyn MediatorApi,
    job: MediatorJob,
    settings: &PollSettings,
) -> AppResult<MediatorJob> {
    let started = Instant::now();
    let deadline = started + settings.timeout;
    let job_id = job.id.clone();
    let id = job_id.as_str();
    let mut job = job;

    while !job.state().is_terminal() {
        let waited = started.elapsed();
        if waited >= settings.timeout {
            return Err(AppError::JobTimeout {
                job_id,
                waited,
            });
        }

        sleep(settings.interval.min(settings.timeout - waited)).await;
        // Retry backoff counts against the same deadline
        let fetch = with_retry(
            move || api.get_job_by_id(id),
            settings.fetch_retries,
            AppError::is_transient,
        );
        job = match timeout_at(deadline, fetch).await {
            Ok(fetched) => fetched?,
            Err(_) => {
                return Err(AppError::JobTimeout {
                    job_id,
                    waited: started.elapsed(),
                })
            }
        };
        debug!(job_id = %job.id, status = ?job.state(), "Polled job status");
    }

    if job.state() == JobStatus::Failed {
        let message = job
            .status
            .status_message
            .clone()
            .unwrap_or_else(|| "job failed without a status message".to_string());
        return Err(AppError::JobFailed { job_id, message });
    }

    info!(job_id = %job.id, elapsed_secs = started.elapsed().as_secs(), "Job completed");
    Ok(job)
}
