//! Invocation entry points.
//!
//! [`handle`] runs a refresh for a trigger event; [`handle_object_created`]
//! applies output-object permissions for an S3 notification. Both read their
//! configuration from the environment before touching any AWS service.

use std::future::Future;

use tracing::{debug, info, Instrument};

use refresh_athena::{AthenaClient, QueryService};
use refresh_core::{AclConfig, ConfigError, ExtractionConfig};
use refresh_storage::{grant_output_access, GrantOutcome, ObjectStoreClient, S3Backend, S3Event};

use crate::aws::load_sdk_config;
use crate::error::RefreshError;
use crate::orchestrator::{refresh, RefreshReport};

/// Per-invocation metadata supplied by whatever triggered the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
    pub invoked_by: String,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>, invoked_by: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            invoked_by: invoked_by.into(),
        }
    }

    /// Context for a run started by hand or by a local scheduler.
    pub fn local() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), "local")
    }
}

/// Refresh entry point. The trigger payload is opaque and only logged.
pub async fn handle(event: serde_json::Value, ctx: InvocationContext) -> Result<(), RefreshError> {
    handle_with(&event, &ctx, ExtractionConfig::from_env, |config| async move {
        let sdk = load_sdk_config(config.region.as_deref()).await;
        (
            S3Backend::from_sdk_config(&sdk),
            AthenaClient::from_sdk_config(&sdk, config.workgroup.clone()),
        )
    })
    .await
    .map(|_| ())
}

/// [`handle`] with injectable configuration loading and client construction.
///
/// `load` runs first; `connect` is only called once configuration is
/// complete, so a missing setting fails before any client exists.
pub async fn handle_with<L, C, Fut, S, Q>(
    event: &serde_json::Value,
    ctx: &InvocationContext,
    load: L,
    connect: C,
) -> Result<RefreshReport, RefreshError>
where
    L: FnOnce() -> Result<ExtractionConfig, ConfigError>,
    C: FnOnce(ExtractionConfig) -> Fut,
    Fut: Future<Output = (S, Q)>,
    S: ObjectStoreClient,
    Q: QueryService,
{
    let span = tracing::info_span!(
        "refresh",
        request_id = %ctx.request_id,
        invoked_by = %ctx.invoked_by
    );

    async move {
        debug!(event = %event, "Trigger received");

        let config = load()?;
        config.log_summary();

        let (store, queries) = connect(config.clone()).await;
        let report = refresh(&config, &store, &queries).await?;

        info!(
            folder_created = report.folder_created,
            objects_deleted = report.objects_deleted,
            executions = report.extraction.executions(),
            "Invocation finished"
        );
        Ok::<_, RefreshError>(report)
    }
    .instrument(span)
    .await
}

/// Object-created entry point for the output bucket.
///
/// Delete requests return before any settings are read.
pub async fn handle_object_created(
    event: serde_json::Value,
    ctx: InvocationContext,
) -> Result<GrantOutcome, RefreshError> {
    let span = tracing::info_span!("grant", request_id = %ctx.request_id);

    async move {
        let event = S3Event::from_value(event)?;
        if event.is_delete() {
            debug!("Delete request, nothing to grant");
            return Ok(GrantOutcome::DeleteRequest);
        }

        let config = AclConfig::from_env()?;
        let sdk = load_sdk_config(config.region.as_deref()).await;
        let store = S3Backend::from_sdk_config(&sdk);

        let outcome = grant_output_access(&store, &event, &config).await?;
        Ok::<_, RefreshError>(outcome)
    }
    .instrument(span)
    .await
}
