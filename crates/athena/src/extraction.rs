//! Launching the extraction: drop the shared staging table, then run each
//! matching named query.

use std::time::Duration;

use tracing::{info, warn};

use refresh_core::{ExtractionConfig, LaunchMode};

use crate::client::{AthenaError, ExecutionState, QueryExecutionRequest, QueryService, ResultEncryption};
use crate::named_query::find_matching;
use crate::poll::{wait_for_terminal, PollSettings};

/// Staging table shared by every extraction query in the database.
pub const STAGING_TABLE: &str = "temp_table";

/// `DROP TABLE <database>.temp_table`, independent of which query matched.
pub fn drop_statement(database: &str) -> String {
    format!("DROP TABLE {}.{}", database, STAGING_TABLE)
}

/// Everything `run_extraction` needs, usually built from [`ExtractionConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub database: String,
    /// Referenced by the registered query itself; carried for logging.
    pub table: String,
    pub query_name_fragment: String,
    pub output_location: String,
    pub workgroup: Option<String>,
    pub launch_mode: LaunchMode,
    pub drop_timeout: Duration,
    pub poll: PollSettings,
}

impl ExtractionRequest {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            database: config.source_database.clone(),
            table: config.source_table.clone(),
            query_name_fragment: config.query_name_fragment.clone(),
            output_location: config.query_output_location.clone(),
            workgroup: config.workgroup.clone(),
            launch_mode: config.launch_mode,
            drop_timeout: Duration::from_secs(config.drop_timeout_seconds as u64),
            poll: PollSettings::default(),
        }
    }

    fn execution(&self, query_string: String) -> QueryExecutionRequest {
        QueryExecutionRequest {
            query_string,
            output_location: self.output_location.clone(),
            encryption: ResultEncryption::SseS3,
            workgroup: self.workgroup.clone(),
        }
    }
}

/// The drop+create pair launched for one matching named query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedPair {
    pub query_name: String,
    pub drop_execution_id: String,
    /// Terminal state of the drop; `None` when it was not observed.
    pub drop_state: Option<ExecutionState>,
    pub create_execution_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub matched: usize,
    pub launched: Vec<LaunchedPair>,
}

impl ExtractionSummary {
    /// Number of executions submitted.
    pub fn executions(&self) -> usize {
        self.launched.len() * 2
    }
}

/// Locate every named query whose name contains the fragment and launch a
/// drop+create pair for each.
///
/// In [`LaunchMode::AwaitDrop`] the create is started only once the drop is
/// terminal. A failed or cancelled drop is logged and the create still runs,
/// since the staging table may simply not exist yet. In
/// [`LaunchMode::FireAndForget`] both are submitted back-to-back. Neither mode
/// waits for the create. Errors abort immediately; already submitted
/// executions are not rolled back.
pub async fn run_extraction(
    service: &dyn QueryService,
    request: &ExtractionRequest,
) -> Result<ExtractionSummary, AthenaError> {
    let matches = find_matching(service, &request.query_name_fragment).await?;

    if matches.is_empty() {
        warn!(
            fragment = %request.query_name_fragment,
            "No named query matched, nothing launched"
        );
    } else if matches.len() > 1 {
        info!(
            fragment = %request.query_name_fragment,
            matched = matches.len(),
            "Several named queries matched, launching one pair each"
        );
    }

    let drop_sql = drop_statement(&request.database);
    let mut summary = ExtractionSummary {
        matched: matches.len(),
        launched: Vec::with_capacity(matches.len()),
    };

    for query in matches {
        let drop_execution_id = service
            .start_query_execution(&request.execution(drop_sql.clone()))
            .await?;
        info!(
            query = %query.name,
            execution_id = %drop_execution_id,
            statement = %drop_sql,
            "Staging table drop started"
        );

        let drop_state = match request.launch_mode {
            LaunchMode::FireAndForget => None,
            LaunchMode::AwaitDrop => {
                let state = wait_for_terminal(
                    service,
                    &drop_execution_id,
                    request.drop_timeout,
                    &request.poll,
                )
                .await?;
                match &state {
                    ExecutionState::Failed { reason } => warn!(
                        execution_id = %drop_execution_id,
                        reason = %reason,
                        "Staging table drop failed, continuing"
                    ),
                    ExecutionState::Cancelled => warn!(
                        execution_id = %drop_execution_id,
                        "Staging table drop cancelled, continuing"
                    ),
                    _ => {}
                }
                Some(state)
            }
        };

        let create_execution_id = service
            .start_query_execution(&request.execution(query.query_string.clone()))
            .await?;
        info!(
            query = %query.name,
            execution_id = %create_execution_id,
            database = %request.database,
            table = %request.table,
            "Extraction query started"
        );

        summary.launched.push(LaunchedPair {
            query_name: query.name,
            drop_execution_id,
            drop_state,
            create_execution_id,
        });
    }

    Ok(summary)
}
