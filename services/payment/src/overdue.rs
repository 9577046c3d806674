use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};

use kairos_common::AppError;

use crate::ledger::LedgerService;

/// Schedules the nightly pending→overdue sweep. The returned scheduler
/// must be kept alive for the jobs to keep firing.
pub async fn start_overdue_job(
    cron_expression: &str,
    ledger: LedgerService,
) -> Result<JobScheduler, AppError> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| AppError::Internal(format!("Scheduler init failed: {}", e)))?;

    let job = Job::new_async(cron_expression, move |_uuid, _lock| {
        let ledger = ledger.clone();
        Box::pin(async move {
            match ledger.recompute_overdue(Utc::now().date_naive()).await {
                Ok(transitioned) => {
                    tracing::info!("overdue sweep moved {} payments", transitioned);
                }
                Err(e) => {
                    tracing::error!("overdue sweep failed: {}", e);
                }
            }
        })
    })
    .map_err(|e| AppError::Internal(format!("Invalid overdue cron expression: {}", e)))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to schedule overdue job: {}", e)))?;

    scheduler
        .start()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to start scheduler: {}", e)))?;

    Ok(scheduler)
}
