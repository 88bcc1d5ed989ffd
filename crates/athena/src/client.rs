//! AWS Athena named-query and execution client.
//!
//! [`QueryService`] is the seam the extraction runs against; [`AthenaClient`]
//! implements it over the AWS SDK.

use async_trait::async_trait;
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{
    EncryptionConfiguration, EncryptionOption, QueryExecutionState, ResultConfiguration,
};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors that can occur during Athena operations.
#[derive(Debug, thiserror::Error)]
pub enum AthenaError {
    /// An AWS SDK error (stringified with full context).
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// The execution did not reach a terminal state within the configured bound.
    #[error("Execution {execution_id} did not finish within {seconds}s")]
    ExecutionTimeout { execution_id: String, seconds: u64 },
}

impl AthenaError {
    fn sdk(operation: &str, err: impl std::fmt::Display) -> Self {
        AthenaError::AwsSdk(format!("{operation}: {err}"))
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A registered, reusable query definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    pub id: String,
    pub name: String,
    pub query_string: String,
}

/// One `ListNamedQueries` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedQueryIdPage {
    pub ids: Vec<String>,
    pub next_token: Option<String>,
}

/// Server-side encryption applied to result files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultEncryption {
    /// Keys managed by S3 (`SSE_S3`).
    #[default]
    SseS3,
}

impl ResultEncryption {
    fn option(self) -> EncryptionOption {
        match self {
            ResultEncryption::SseS3 => EncryptionOption::SseS3,
        }
    }
}

/// A query execution to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExecutionRequest {
    pub query_string: String,
    pub output_location: String,
    pub encryption: ResultEncryption,
    pub workgroup: Option<String>,
}

/// Observed state of a launched execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    Queued,
    Running,
    Succeeded,
    Failed { reason: String },
    Cancelled,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Succeeded | ExecutionState::Failed { .. } | ExecutionState::Cancelled
        )
    }
}

/// The query-service operations the extraction depends on.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// List one page of named-query ids.
    async fn list_named_query_ids(
        &self,
        next_token: Option<&str>,
    ) -> Result<NamedQueryIdPage, AthenaError>;

    async fn get_named_query(&self, id: &str) -> Result<NamedQuery, AthenaError>;

    /// Start an execution and return its id without waiting for it.
    async fn start_query_execution(
        &self,
        request: &QueryExecutionRequest,
    ) -> Result<String, AthenaError>;

    async fn get_execution_state(&self, execution_id: &str) -> Result<ExecutionState, AthenaError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`QueryService`] backed by the AWS SDK Athena client.
#[derive(Clone)]
pub struct AthenaClient {
    athena_client: aws_sdk_athena::Client,
    /// Scopes named-query listing; executions carry their own workgroup.
    workgroup: Option<String>,
}

impl AthenaClient {
    pub fn new(athena_client: aws_sdk_athena::Client, workgroup: Option<String>) -> Self {
        Self {
            athena_client,
            workgroup,
        }
    }

    /// Build from a loaded SDK config (region/credentials resolved by the caller).
    pub fn from_sdk_config(config: &aws_types::SdkConfig, workgroup: Option<String>) -> Self {
        info!(
            region = config.region().map(|r| r.as_ref()).unwrap_or("(unset)"),
            workgroup = workgroup.as_deref().unwrap_or("(default)"),
            "AthenaClient initialised"
        );
        Self::new(aws_sdk_athena::Client::new(config), workgroup)
    }
}

#[async_trait]
impl QueryService for AthenaClient {
    async fn list_named_query_ids(
        &self,
        next_token: Option<&str>,
    ) -> Result<NamedQueryIdPage, AthenaError> {
        let resp = self
            .athena_client
            .list_named_queries()
            .set_work_group(self.workgroup.clone())
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| AthenaError::sdk("ListNamedQueries", DisplayErrorContext(&e)))?;

        Ok(NamedQueryIdPage {
            ids: resp.named_query_ids().to_vec(),
            next_token: resp.next_token().map(str::to_string),
        })
    }

    async fn get_named_query(&self, id: &str) -> Result<NamedQuery, AthenaError> {
        let resp = self
            .athena_client
            .get_named_query()
            .named_query_id(id)
            .send()
            .await
            .map_err(|e| AthenaError::sdk("GetNamedQuery", DisplayErrorContext(&e)))?;

        let nq = resp
            .named_query()
            .ok_or_else(|| AthenaError::AwsSdk(format!("No named query returned for {id}")))?;

        Ok(NamedQuery {
            id: nq.named_query_id().unwrap_or(id).to_string(),
            name: nq.name().to_string(),
            query_string: nq.query_string().to_string(),
        })
    }

    async fn start_query_execution(
        &self,
        request: &QueryExecutionRequest,
    ) -> Result<String, AthenaError> {
        let encryption = EncryptionConfiguration::builder()
            .encryption_option(request.encryption.option())
            .build()
            .map_err(|e| AthenaError::sdk("EncryptionConfiguration", e))?;

        let resp = self
            .athena_client
            .start_query_execution()
            .query_string(&request.query_string)
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(&request.output_location)
                    .encryption_configuration(encryption)
                    .build(),
            )
            .set_work_group(request.workgroup.clone())
            .send()
            .await
            .map_err(|e| AthenaError::sdk("StartQueryExecution", DisplayErrorContext(&e)))?;

        let execution_id = resp
            .query_execution_id()
            .ok_or_else(|| AthenaError::AwsSdk("No query execution ID returned".into()))?
            .to_string();

        debug!(execution_id = %execution_id, "Query execution started");
        Ok(execution_id)
    }

    async fn get_execution_state(&self, execution_id: &str) -> Result<ExecutionState, AthenaError> {
        let resp = self
            .athena_client
            .get_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
            .map_err(|e| AthenaError::sdk("GetQueryExecution", DisplayErrorContext(&e)))?;

        let status = resp
            .query_execution()
            .ok_or_else(|| AthenaError::AwsSdk("No query execution in response".into()))?
            .status();

        let state = status
            .and_then(|s| s.state())
            .cloned()
            .unwrap_or(QueryExecutionState::Queued);

        Ok(match state {
            QueryExecutionState::Succeeded => ExecutionState::Succeeded,
            QueryExecutionState::Failed => ExecutionState::Failed {
                reason: status
                    .and_then(|s| s.state_change_reason())
                    .unwrap_or("unknown")
                    .to_string(),
            },
            QueryExecutionState::Cancelled => ExecutionState::Cancelled,
            QueryExecutionState::Running => ExecutionState::Running,
            // Queued | unknown future variant
            _ => ExecutionState::Queued,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests (no AWS calls)
// ---------------------------------------------------------------------------
