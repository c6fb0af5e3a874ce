//! Catalog data access
//!
//! Free async functions over a `SqlitePool`. Multi-step mutations run in
//! their own transaction; file cleanup happens only after the database
//! change is committed.

pub mod composers;
pub mod compositions;
pub mod dashboard;
pub mod duplicates;
pub mod genres;
pub mod playlists;
pub mod random_work;
pub mod recordings;
pub(crate) mod rows;
pub mod scores;
pub mod users;
pub mod works;

/// Trimmed value, or None when blank
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Reject a blank required field
pub(crate) fn require_text(field: &str, value: &str) -> crate::ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Final positions for a reorder request
///
/// `requested` ids that are `current` members come first, in the given
/// order; remaining members follow in their current relative order.
/// Unknown and repeated ids are ignored.
pub(crate) fn reorder_positions(current: &[i64], requested: &[i64]) -> Vec<i64> {
    let mut ordered: Vec<i64> = Vec::with_capacity(current.len());
    for id in requested {
        if current.contains(id) && !ordered.contains(id) {
            ordered.push(*id);
        }
    }
    for id in current {
        if !ordered.contains(id) {
            ordered.push(*id);
        }
    }
    ordered
}
