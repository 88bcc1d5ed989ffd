//! Locating registered named queries by display name.

use tracing::{debug, info};

use crate::client::{AthenaError, NamedQuery, QueryService};

/// List every named-query id, following `NextToken` until exhausted.
pub async fn list_named_query_ids(service: &dyn QueryService) -> Result<Vec<String>, AthenaError> {
    let mut ids = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = service.list_named_query_ids(token.as_deref()).await?;
        ids.extend(page.ids);

        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    debug!(count = ids.len(), "Listed named queries");
    Ok(ids)
}

/// Fetch every named query and keep those whose name contains `fragment`.
///
/// Substring match, case-sensitive, in listing order. An empty fragment
/// matches every query.
pub async fn find_matching(
    service: &dyn QueryService,
    fragment: &str,
) -> Result<Vec<NamedQuery>, AthenaError> {
    let ids = list_named_query_ids(service).await?;
    let mut matches = Vec::new();

    for id in &ids {
        let query = service.get_named_query(id).await?;
        if query.name.contains(fragment) {
            debug!(id = %query.id, name = %query.name, "Named query matched");
            matches.push(query);
        }
    }

    info!(
        fragment,
        scanned = ids.len(),
        matched = matches.len(),
        "Located extraction queries"
    );
    Ok(matches)
}
