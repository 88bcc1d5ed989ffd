use std::time::Instant;

use tracing::info;

use refresh_athena::{run_extraction, ExtractionRequest, ExtractionSummary, QueryService};
use refresh_core::ExtractionConfig;
use refresh_storage::{empty_folder, ensure_folder, ObjectStoreClient};

/// What one refresh did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub folder_created: bool,
    pub objects_deleted: usize,
    pub extraction: ExtractionSummary,
}

/// Run the refresh: ensure the output folder, empty it, then launch the
/// extraction. Each step starts only after the previous one succeeded, so
/// the folder is always emptied before any execution is submitted.
pub async fn refresh(
    config: &ExtractionConfig,
    store: &dyn ObjectStoreClient,
    queries: &dyn QueryService,
) -> Result<RefreshReport, crate::RefreshError> {
    let start = Instant::now();

    let folder_created = ensure_folder(store, &config.output_bucket, &config.output_folder).await?;
    let objects_deleted = empty_folder(store, &config.output_bucket, &config.output_folder).await?;

    let request = ExtractionRequest::from_config(config);
    let extraction = run_extraction(queries, &request).await?;

    info!(
        bucket = %config.output_bucket,
        folder = %config.output_folder,
        folder_created,
        objects_deleted,
        matched = extraction.matched,
        executions = extraction.executions(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Refresh complete"
    );

    Ok(RefreshReport {
        folder_created,
        objects_deleted,
        extraction,
    })
}
