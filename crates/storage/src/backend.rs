use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{AccessControlPolicy, Grant, Grantee, Owner, Permission, Type};
use tracing::debug;

use crate::error::StorageError;

/// An item in a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
}

/// One `ListObjectsV2` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub objects: Vec<StoredObject>,
    /// Key count as reported by the service for this page.
    pub key_count: usize,
    /// Continuation token, present only when the listing was truncated.
    pub next_token: Option<String>,
}

/// A canonical-user account referenced by an object ACL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountIdentity {
    pub display_name: String,
    pub canonical_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclPermission {
    FullControl,
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclGrant {
    pub grantee: AccountIdentity,
    pub permission: AclPermission,
}

/// Access policy applied to a single object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAcl {
    pub owner: AccountIdentity,
    pub grants: Vec<AclGrant>,
}

/// The object-store operations the refresh depends on.
///
/// Implemented by [`S3Backend`] in production and by recording fakes in tests.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// List one page of objects, optionally restricted to `prefix`.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError>;

    /// Put a zero-byte object at `key`.
    async fn put_empty_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    async fn put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &ObjectAcl,
    ) -> Result<(), StorageError>;
}

/// S3 backend over the AWS SDK client.
#[derive(Clone)]
pub struct S3Backend {
    client: aws_sdk_s3::Client,
}

impl S3Backend {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build from a loaded SDK config (region/credentials resolved by the caller).
    pub fn from_sdk_config(config: &aws_types::SdkConfig) -> Self {
        Self::new(aws_sdk_s3::Client::new(config))
    }
}

fn target(bucket: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("s3://{}/{}", bucket, key),
        None => format!("s3://{}", bucket),
    }
}

fn sdk_grant(grant: &AclGrant) -> Result<Grant, StorageError> {
    let grantee = Grantee::builder()
        .r#type(Type::CanonicalUser)
        .display_name(&grant.grantee.display_name)
        .id(&grant.grantee.canonical_id)
        .build()
        .map_err(|e| StorageError::InvalidAcl(e.to_string()))?;

    let permission = match grant.permission {
        AclPermission::FullControl => Permission::FullControl,
        AclPermission::Read => Permission::Read,
    };

    Ok(Grant::builder()
        .grantee(grantee)
        .permission(permission)
        .build())
}

#[async_trait]
impl ObjectStoreClient for S3Backend {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(str::to_string))
            .set_continuation_token(continuation_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| StorageError::sdk("ListObjectsV2", target(bucket, prefix), DisplayErrorContext(&e)))?;

        let objects: Vec<StoredObject> = resp
            .contents()
            .iter()
            .filter_map(|obj| obj.key())
            .map(|key| StoredObject {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
            .collect();

        let key_count = resp
            .key_count()
            .map(|n| n.max(0) as usize)
            .unwrap_or(objects.len());

        let next_token = if resp.is_truncated().unwrap_or(false) {
            resp.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        debug!(
            bucket,
            prefix = prefix.unwrap_or(""),
            key_count,
            truncated = next_token.is_some(),
            "Listed objects"
        );

        Ok(ObjectPage {
            objects,
            key_count,
            next_token,
        })
    }

    async fn put_empty_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from_static(b""))
            .send()
            .await
            .map_err(|e| StorageError::sdk("PutObject", target(bucket, Some(key)), DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::sdk("DeleteObject", target(bucket, Some(key)), DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &ObjectAcl,
    ) -> Result<(), StorageError> {
        let owner = Owner::builder()
            .display_name(&acl.owner.display_name)
            .id(&acl.owner.canonical_id)
            .build();

        let grants = acl
            .grants
            .iter()
            .map(sdk_grant)
            .collect::<Result<Vec<_>, _>>()?;

        let policy = AccessControlPolicy::builder()
            .owner(owner)
            .set_grants(Some(grants))
            .build();

        self.client
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .access_control_policy(policy)
            .send()
            .await
            .map_err(|e| StorageError::sdk("PutObjectAcl", target(bucket, Some(key)), DisplayErrorContext(&e)))?;
        Ok(())
    }
}
