//! Object-store side of the refresh: keeping the output folder present and
//! empty, and granting cross-account read access on freshly written results.

pub mod acl;
pub mod backend;
pub mod error;
pub mod folder;

#[cfg(test)]
mod fake;

pub use acl::{
    decode_object_key, folder_acl, grant_output_access, top_level_folder, GrantError,
    GrantOutcome, S3Event,
};
pub use backend::{
    AccountIdentity, AclGrant, AclPermission, ObjectAcl, ObjectPage, ObjectStoreClient,
    S3Backend, StoredObject,
};
pub use error::StorageError;
pub use folder::{empty_folder, ensure_folder};
