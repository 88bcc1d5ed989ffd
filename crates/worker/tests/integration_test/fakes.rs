//! Recording fakes sharing one timeline so tests can assert call order
//! across the object store and the query service.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use refresh_athena::{
    AthenaError, ExecutionState, NamedQuery, NamedQueryIdPage, QueryExecutionRequest,
    QueryService,
};
use refresh_core::{ExtractionConfig, LaunchMode};
use refresh_storage::{ObjectAcl, ObjectPage, ObjectStoreClient, StorageError, StoredObject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { prefix: Option<String> },
    Put { key: String },
    Delete { key: String },
    ListQueries,
    GetQuery { id: String },
    Start { query_string: String, output_location: String },
    Poll { execution_id: String },
}

pub type Timeline = Arc<Mutex<Vec<Call>>>;

pub struct FakeStore {
    pub keys: Mutex<Vec<String>>,
    pub timeline: Timeline,
}

impl FakeStore {
    pub fn new(keys: &[&str], timeline: Timeline) -> Self {
        Self {
            keys: Mutex::new(keys.iter().map(|k| k.to_string()).collect()),
            timeline,
        }
    }
}

#[async_trait]
impl ObjectStoreClient for FakeStore {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        _continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError> {
        self.timeline.lock().unwrap().push(Call::List {
            prefix: prefix.map(str::to_string),
        });
        let objects: Vec<StoredObject> = self
            .keys
            .lock()
            .unwrap()
            .iter()
            .filter(|k| prefix.map_or(true, |p| k.starts_with(p)))
            .map(|k| StoredObject {
                bucket: bucket.to_string(),
                key: k.clone(),
            })
            .collect();
        Ok(ObjectPage {
            key_count: objects.len(),
            objects,
            next_token: None,
        })
    }

    async fn put_empty_object(&self, _bucket: &str, key: &str) -> Result<(), StorageError> {
        self.timeline.lock().unwrap().push(Call::Put { key: key.to_string() });
        self.keys.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn delete_object(&self, _bucket: &str, key: &str) -> Result<(), StorageError> {
        self.timeline.lock().unwrap().push(Call::Delete { key: key.to_string() });
        self.keys.lock().unwrap().retain(|k| k != key);
        Ok(())
    }

    async fn put_object_acl(
        &self,
        _bucket: &str,
        _key: &str,
        _acl: &ObjectAcl,
    ) -> Result<(), StorageError> {
        unreachable!("refresh never touches ACLs")
    }
}

pub struct FakeQueries {
    pub queries: Vec<NamedQuery>,
    pub timeline: Timeline,
}

impl FakeQueries {
    pub fn new(queries: &[(&str, &str)], timeline: Timeline) -> Self {
        Self {
            queries: queries
                .iter()
                .enumerate()
                .map(|(i, (name, sql))| NamedQuery {
                    id: format!("nq-{i}"),
                    name: name.to_string(),
                    query_string: sql.to_string(),
                })
                .collect(),
            timeline,
        }
    }
}

#[async_trait]
impl QueryService for FakeQueries {
    async fn list_named_query_ids(
        &self,
        _next_token: Option<&str>,
    ) -> Result<NamedQueryIdPage, AthenaError> {
        self.timeline.lock().unwrap().push(Call::ListQueries);
        Ok(NamedQueryIdPage {
            ids: self.queries.iter().map(|q| q.id.clone()).collect(),
            next_token: None,
        })
    }

    async fn get_named_query(&self, id: &str) -> Result<NamedQuery, AthenaError> {
        self.timeline.lock().unwrap().push(Call::GetQuery { id: id.to_string() });
        self.queries
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or_else(|| AthenaError::AwsSdk(format!("{id} not found")))
    }

    async fn start_query_execution(
        &self,
        request: &QueryExecutionRequest,
    ) -> Result<String, AthenaError> {
        let mut timeline = self.timeline.lock().unwrap();
        timeline.push(Call::Start {
            query_string: request.query_string.clone(),
            output_location: request.output_location.clone(),
        });
        let n = timeline.iter().filter(|c| matches!(c, Call::Start { .. })).count();
        Ok(format!("exec-{n}"))
    }

    async fn get_execution_state(&self, execution_id: &str) -> Result<ExecutionState, AthenaError> {
        self.timeline.lock().unwrap().push(Call::Poll {
            execution_id: execution_id.to_string(),
        });
        Ok(ExecutionState::Succeeded)
    }
}

pub fn timeline() -> Timeline {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn config(mode: LaunchMode) -> ExtractionConfig {
    ExtractionConfig {
        profile: String::new(),
        output_bucket: "reports".into(),
        output_folder: "linked/".into(),
        source_database: "map_migrated".into(),
        source_table: "cur_table".into(),
        query_name_fragment: "map-extract".into(),
        query_output_location: "s3://athena-results/map/".into(),
        region: None,
        workgroup: None,
        launch_mode: mode,
        drop_timeout_seconds: 5,
    }
}
