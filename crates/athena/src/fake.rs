//! Scripted in-memory query service for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{
    AthenaError, ExecutionState, NamedQuery, NamedQueryIdPage, QueryExecutionRequest,
    QueryService,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(QueryExecutionRequest),
    Poll(String),
}

#[derive(Default)]
pub struct ScriptedService {
    pub queries: Vec<NamedQuery>,
    pub page_size: Option<usize>,
    /// States returned by successive polls; the last one repeats.
    pub states: Vec<ExecutionState>,
    /// Fail the n-th (0-based) start call.
    pub fail_start_at: Option<usize>,
    pub events: Mutex<Vec<Event>>,
    pub list_calls: Mutex<usize>,
}

impl ScriptedService {
    pub fn with_queries(mut self, queries: &[(&str, &str)]) -> Self {
        self.queries = queries
            .iter()
            .enumerate()
            .map(|(i, (name, sql))| NamedQuery {
                id: format!("nq-{i}"),
                name: name.to_string(),
                query_string: sql.to_string(),
            })
            .collect();
        self
    }

    pub fn with_states(mut self, states: Vec<ExecutionState>) -> Self {
        self.states = states;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn starts(&self) -> Vec<QueryExecutionRequest> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Start(r) => Some(r),
                Event::Poll(_) => None,
            })
            .collect()
    }

    pub fn state_polls(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Poll(_)))
            .count()
    }
}

#[async_trait]
impl QueryService for ScriptedService {
    async fn list_named_query_ids(
        &self,
        next_token: Option<&str>,
    ) -> Result<NamedQueryIdPage, AthenaError> {
        *self.list_calls.lock().unwrap() += 1;

        let page_size = self.page_size.unwrap_or(50);
        let start: usize = next_token.map_or(0, |t| t.parse().unwrap());
        let end = (start + page_size).min(self.queries.len());

        Ok(NamedQueryIdPage {
            ids: self.queries[start..end].iter().map(|q| q.id.clone()).collect(),
            next_token: (end < self.queries.len()).then(|| end.to_string()),
        })
    }

    async fn get_named_query(&self, id: &str) -> Result<NamedQuery, AthenaError> {
        self.queries
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or_else(|| AthenaError::AwsSdk(format!("GetNamedQuery: {id} not found")))
    }

    async fn start_query_execution(
        &self,
        request: &QueryExecutionRequest,
    ) -> Result<String, AthenaError> {
        let mut events = self.events.lock().unwrap();
        let n = events.iter().filter(|e| matches!(e, Event::Start(_))).count();
        if self.fail_start_at == Some(n) {
            return Err(AthenaError::AwsSdk("StartQueryExecution: TooManyRequestsException".into()));
        }
        events.push(Event::Start(request.clone()));
        Ok(format!("exec-{n}"))
    }

    async fn get_execution_state(&self, execution_id: &str) -> Result<ExecutionState, AthenaError> {
        let mut events = self.events.lock().unwrap();
        let n = events.iter().filter(|e| matches!(e, Event::Poll(_))).count();
        events.push(Event::Poll(execution_id.to_string()));
        Ok(self
            .states
            .get(n)
            .or_else(|| self.states.last())
            .cloned()
            .unwrap_or(ExecutionState::Succeeded))
    }
}
