//! Recording in-memory store for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{ObjectAcl, ObjectPage, ObjectStoreClient, StoredObject};
use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { prefix: Option<String>, token: Option<String> },
    Put { key: String },
    Delete { key: String },
    PutAcl { key: String, acl: ObjectAcl },
}

/// Serves a fixed set of keys in pages of `page_size` and records every call.
pub struct RecordingStore {
    pub keys: Vec<String>,
    pub page_size: usize,
    pub fail_delete_of: Option<String>,
    pub fail_acl: bool,
    pub calls: Mutex<Vec<Call>>,
}

impl RecordingStore {
    pub fn with_keys(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            page_size: 1000,
            fail_delete_of: None,
            fail_acl: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Put { key } => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { key } => Some(key),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ObjectStoreClient for RecordingStore {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError> {
        self.calls.lock().unwrap().push(Call::List {
            prefix: prefix.map(str::to_string),
            token: continuation_token.map(str::to_string),
        });

        let matching: Vec<&String> = self
            .keys
            .iter()
            .filter(|k| prefix.map_or(true, |p| k.starts_with(p)))
            .collect();
        let start: usize = continuation_token.map_or(0, |t| t.parse().unwrap());
        let end = (start + self.page_size).min(matching.len());

        let objects: Vec<StoredObject> = matching[start..end]
            .iter()
            .map(|k| StoredObject {
                bucket: bucket.to_string(),
                key: k.to_string(),
            })
            .collect();

        Ok(ObjectPage {
            key_count: objects.len(),
            objects,
            next_token: (end < matching.len()).then(|| end.to_string()),
        })
    }

    async fn put_empty_object(&self, _bucket: &str, key: &str) -> Result<(), StorageError> {
        self.calls.lock().unwrap().push(Call::Put { key: key.to_string() });
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.calls.lock().unwrap().push(Call::Delete { key: key.to_string() });
        if self.fail_delete_of.as_deref() == Some(key) {
            return Err(StorageError::sdk("DeleteObject", format!("s3://{bucket}/{key}"), "AccessDenied"));
        }
        Ok(())
    }

    async fn put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &ObjectAcl,
    ) -> Result<(), StorageError> {
        self.calls.lock().unwrap().push(Call::PutAcl {
            key: key.to_string(),
            acl: acl.clone(),
        });
        if self.fail_acl {
            return Err(StorageError::sdk("PutObjectAcl", format!("s3://{bucket}/{key}"), "AccessDenied"));
        }
        Ok(())
    }
}
