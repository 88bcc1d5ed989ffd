//! Output-folder maintenance ahead of a refresh.

use tracing::{debug, info};

use crate::backend::ObjectStoreClient;
use crate::error::StorageError;

/// Make sure the output folder is visible by writing a zero-byte marker at
/// `prefix`, but only when the bucket holds no objects at all.
///
/// The check is bucket-wide: any existing object (under `prefix` or not)
/// means no marker is written. Returns whether a marker was created.
pub async fn ensure_folder(
    store: &dyn ObjectStoreClient,
    bucket: &str,
    prefix: &str,
) -> Result<bool, StorageError> {
    let page = store.list_objects(bucket, None, None).await?;

    if page.key_count > 0 {
        debug!(bucket, prefix, key_count = page.key_count, "Bucket not empty, folder marker skipped");
        return Ok(false);
    }

    store.put_empty_object(bucket, prefix).await?;
    info!(bucket, prefix, "Created output folder marker");
    Ok(true)
}

/// Delete every object under `prefix`, one delete per key in listing order.
///
/// The folder marker itself (key equal to `prefix`) is kept so the folder
/// stays visible. Follows continuation tokens until the listing is
/// exhausted. The first failed delete aborts the remaining work. Returns
/// the number of deletes.
pub async fn empty_folder(
    store: &dyn ObjectStoreClient,
    bucket: &str,
    prefix: &str,
) -> Result<usize, StorageError> {
    let start = std::time::Instant::now();
    let mut deleted = 0usize;
    let mut token: Option<String> = None;

    loop {
        let page = store
            .list_objects(bucket, Some(prefix), token.as_deref())
            .await?;

        for object in page.objects.iter().filter(|o| o.key != prefix) {
            store.delete_object(bucket, &object.key).await?;
            deleted += 1;
            debug!(bucket, key = %object.key, "Deleted object");
        }

        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    info!(
        bucket,
        prefix,
        deleted,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Emptied output folder"
    );
    Ok(deleted)
}
