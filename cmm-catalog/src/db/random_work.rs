//! "Play something" selection
//!
//! Picks a random work that has playable audio, then one random
//! performance of it. A performance is the set of its recordings sharing
//! the same performers and recording year.

use super::rows::{self, recordings_with_details_sql};
use super::works::get_work_with_composer;
use crate::models::{RandomWork, RecordingWithDetails};
use crate::ApiResult;
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Random candidate not in `exclude`, or any candidate if all are excluded
fn choose_work_id<R: Rng + ?Sized>(candidates: &[i64], exclude: &[i64], rng: &mut R) -> Option<i64> {
    let allowed: Vec<i64> = candidates
        .iter()
        .copied()
        .filter(|id| !exclude.contains(id))
        .collect();

    if allowed.is_empty() {
        candidates.choose(rng).copied()
    } else {
        allowed.choose(rng).copied()
    }
}

/// Split recordings into (performers, year) groups, keeping first-seen order
fn group_performances(
    recordings: Vec<RecordingWithDetails>,
) -> Vec<Vec<RecordingWithDetails>> {
    let mut groups: Vec<((Option<String>, Option<i64>), Vec<RecordingWithDetails>)> = Vec::new();

    for recording in recordings {
        let key = (
            recording.recording.performers.clone(),
            recording.recording.recording_year,
        );
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(recording),
            None => groups.push((key, vec![recording])),
        }
    }

    groups.into_iter().map(|(_, members)| members).collect()
}

fn choose_group<R: Rng + ?Sized>(
    recordings: Vec<RecordingWithDetails>,
    rng: &mut R,
) -> Vec<RecordingWithDetails> {
    let mut groups = group_performances(recordings);
    if groups.is_empty() {
        return Vec::new();
    }
    let index = rng.gen_range(0..groups.len());
    groups.swap_remove(index)
}

/// Random playable work with one performance of it
///
/// Works listed in `exclude` (recently played) are skipped unless nothing
/// else is playable. Returns `None` when no work has audio.
pub async fn random_playable_work(
    pool: &SqlitePool,
    exclude: &[i64],
) -> ApiResult<Option<RandomWork>> {
    let candidates: Vec<i64> = sqlx::query(
        r#"
        SELECT DISTINCT c.work_id AS work_id
        FROM recordings r
        JOIN compositions c ON c.id = r.composition_id
        WHERE r.duration > 0
        ORDER BY c.work_id
        "#,
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(|r| r.try_get("work_id"))
    .collect::<Result<_, _>>()?;

    let Some(work_id) = choose_work_id(&candidates, exclude, &mut rand::thread_rng()) else {
        return Ok(None);
    };
    debug!(work_id, candidates = candidates.len(), "Picked random work");

    let work = get_work_with_composer(pool, work_id).await?;

    let sql = format!(
        "{} WHERE c.work_id = ? AND r.duration > 0 ORDER BY c.sort_order, c.id, r.id",
        recordings_with_details_sql()
    );
    let recordings = sqlx::query(&sql)
        .bind(work_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(rows::recording_with_details)
        .collect::<Result<Vec<_>, _>>()?;

    let recordings = choose_group(recordings, &mut rand::thread_rng());

    Ok(Some(RandomWork { work, recordings }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_choose_respects_exclusion() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(choose_work_id(&[1, 2, 3], &[1, 3], &mut rng), Some(2));
        }
    }

    #[test]
    fn test_choose_falls_back_when_everything_excluded() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = choose_work_id(&[4, 5], &[4, 5], &mut rng).unwrap();
        assert!([4, 5].contains(&picked));
        assert_eq!(choose_work_id(&[], &[1], &mut rng), None);
    }
}
