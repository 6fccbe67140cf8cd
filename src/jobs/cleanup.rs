use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tower_sessions::ExpiredDeletion;

use crate::models::magic_link::MagicLink;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub magic_links_deleted: u64,
    pub sessions_purged: bool,
    pub errors: usize,
}

/// Background job that removes expired magic links and sessions.
///
/// Each step runs even if the other fails; failures are logged and counted
/// so the next tick can retry.
pub async fn purge_expired<S>(pool: &PgPool, session_store: &S) -> CleanupStats
where
    S: ExpiredDeletion,
{
    let mut stats = CleanupStats::default();

    match MagicLink::delete_expired(pool).await {
        Ok(deleted) => stats.magic_links_deleted = deleted,
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete expired magic links");
            stats.errors += 1;
        }
    }

    match session_store.delete_expired().await {
        Ok(()) => stats.sessions_purged = true,
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete expired sessions");
            stats.errors += 1;
        }
    }

    tracing::info!(?stats, "Expired record cleanup completed");

    stats
}

/// Registers [`purge_expired`] on `schedule` (six-field cron, seconds first)
pub async fn schedule<S>(
    scheduler: &JobScheduler,
    schedule: &str,
    pool: PgPool,
    session_store: S,
) -> Result<(), JobSchedulerError>
where
    S: ExpiredDeletion + Clone + 'static,
{
    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let pool = pool.clone();
        let session_store = session_store.clone();
        Box::pin(async move {
            purge_expired(&pool, &session_store).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(schedule, "Cleanup job scheduled");

    Ok(())
}
