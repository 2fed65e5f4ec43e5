//! Notification fan-out.
//!
//! Writes one notification row per distinct recipient. Fan-out is a
//! best-effort side channel: callers triggered by a business write log a
//! failure and carry on — the triggering write is never undone.

use std::collections::BTreeSet;

use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::db::Db;
use crate::errors::AppResult;

/// Deduplicate recipient ids, preserving a deterministic order.
pub fn dedup_recipients(user_ids: &[String]) -> Vec<String> {
    user_ids
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Persist one notification per distinct recipient in a single bulk insert.
/// An empty recipient list is a no-op, not an error. Returns the number of
/// rows written.
pub async fn notify_users(
    pool: &Db,
    user_ids: &[String],
    title: &str,
    message: &str,
) -> AppResult<u64> {
    let recipients = dedup_recipients(user_ids);
    if recipients.is_empty() {
        return Ok(0);
    }

    let mut builder =
        QueryBuilder::new("INSERT INTO notifications (id, user_id, title, message) ");
    builder.push_values(&recipients, |mut b, user_id| {
        b.push_bind(Uuid::new_v4().to_string())
            .push_bind(user_id)
            .push_bind(title)
            .push_bind(message);
    });

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

/// Resolve the distinct user ids of farmers who have at least one detection
/// referencing any of the given diseases.
pub async fn farmer_users_for_diseases(
    pool: &Db,
    disease_ids: &[String],
) -> AppResult<Vec<String>> {
    if disease_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::new(
        "SELECT DISTINCT f.user_id
         FROM detections det
         JOIN farmers f ON f.id = det.farmer_id
         WHERE det.disease_id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in disease_ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    let user_ids: Vec<String> = builder.build_query_scalar().fetch_all(pool).await?;
    Ok(user_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_removes_duplicates_and_sorts() {
        let ids = vec![
            "b".to_owned(),
            "a".to_owned(),
            "b".to_owned(),
            "c".to_owned(),
            "a".to_owned(),
        ];
        assert_eq!(dedup_recipients(&ids), vec!["a", "b", "c"]);
    }

    #[test]
    fn dedup_of_empty_input_is_empty() {
        assert!(dedup_recipients(&[]).is_empty());
    }
}
