pub mod client;
pub mod extraction;
pub mod named_query;
pub mod poll;

#[cfg(test)]
mod fake;

pub use client::{
    AthenaClient, AthenaError, ExecutionState, NamedQuery, NamedQueryIdPage,
    QueryExecutionRequest, QueryService, ResultEncryption,
};
pub use extraction::{
    drop_statement, run_extraction, ExtractionRequest, ExtractionSummary, LaunchedPair,
    STAGING_TABLE,
};
pub use named_query::{find_matching, list_named_query_ids};
pub use poll::{wait_for_terminal, PollSettings};
