//! Cross-account access for result objects written into the output folder.
//!
//! Runs on S3 object-created notifications. Objects whose top-level folder is
//! the configured output folder get an ACL giving the payer account full
//! control and the linked account read access.

use serde::Deserialize;
use tracing::{debug, error, info};

use refresh_core::AclConfig;

use crate::backend::{AccountIdentity, AclGrant, AclPermission, ObjectAcl, ObjectStoreClient};

#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    #[error("malformed S3 event: {0}")]
    MalformedEvent(String),
}

// ── Event payload ────────────────────────────────────────────────

/// The subset of an S3 event notification this handler reads.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
    /// Set by custom-resource style invocations; `Delete` means nothing to do.
    #[serde(rename = "RequestType", default)]
    pub request_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3BucketEntity,
    pub object: S3ObjectEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3ObjectEntity {
    pub key: String,
}

impl S3Event {
    pub fn from_value(value: serde_json::Value) -> Result<Self, GrantError> {
        serde_json::from_value(value).map_err(|e| GrantError::MalformedEvent(e.to_string()))
    }

    pub fn is_delete(&self) -> bool {
        self.request_type.as_deref() == Some("Delete")
    }
}

// ── Outcome ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    /// Delete request; nothing to grant.
    DeleteRequest,
    /// Object lives outside the output folder.
    OutsideFolder { folder: String },
    Granted { bucket: String, key: String },
    /// The ACL call failed. Logged, not propagated.
    Failed { bucket: String, key: String, error: String },
}

// ── Helpers ──────────────────────────────────────────────────────

/// Decode an event object key: `+` is a space, the rest is percent-encoded.
pub fn decode_object_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// First path segment of `key`.
pub fn top_level_folder(key: &str) -> &str {
    key.split('/').next().unwrap_or("")
}

/// Payer gets full control and ownership; linked account gets read.
pub fn folder_acl(config: &AclConfig) -> ObjectAcl {
    let payer = AccountIdentity {
        display_name: config.payer_account_name.clone(),
        canonical_id: config.payer_canonical_id.clone(),
    };
    let linked = AccountIdentity {
        display_name: config.linked_account_name.clone(),
        canonical_id: config.linked_canonical_id.clone(),
    };

    ObjectAcl {
        owner: payer.clone(),
        grants: vec![
            AclGrant {
                grantee: payer,
                permission: AclPermission::FullControl,
            },
            AclGrant {
                grantee: linked,
                permission: AclPermission::Read,
            },
        ],
    }
}

// ── Handler ──────────────────────────────────────────────────────

/// Apply the output-folder ACL to the object named by the first event record.
pub async fn grant_output_access(
    store: &dyn ObjectStoreClient,
    event: &S3Event,
    config: &AclConfig,
) -> Result<GrantOutcome, GrantError> {
    if event.is_delete() {
        debug!("Delete request, no permissions to apply");
        return Ok(GrantOutcome::DeleteRequest);
    }

    let record = event
        .records
        .first()
        .ok_or_else(|| GrantError::MalformedEvent("event has no Records".into()))?;

    let bucket = record.s3.bucket.name.clone();
    let key = decode_object_key(&record.s3.object.key);
    let folder = top_level_folder(&key);

    if folder != config.output_folder {
        debug!(bucket = %bucket, key = %key, folder, "Object outside output folder, skipped");
        return Ok(GrantOutcome::OutsideFolder {
            folder: folder.to_string(),
        });
    }

    let acl = folder_acl(config);
    match store.put_object_acl(&bucket, &key, &acl).await {
        Ok(()) => {
            info!(bucket = %bucket, key = %key, "Applied output object ACL");
            Ok(GrantOutcome::Granted { bucket, key })
        }
        Err(e) => {
            error!(bucket = %bucket, key = %key, error = %e, "Failed to apply output object ACL");
            Ok(GrantOutcome::Failed {
                bucket,
                key,
                error: e.to_string(),
            })
        }
    }
}
