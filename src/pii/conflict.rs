//! Overlap resolution between candidate spans

use super::PiiEntity;
use std::cmp::Ordering;

/// Resolve overlapping candidates from all recognizers.
///
/// Candidates are ranked by score (highest first), then start offset, then
/// length (longest first); each one is kept only if it overlaps none of the
/// spans kept before it. Survivors are returned ordered by start offset.
/// Zero-score and empty spans are dropped.
pub fn resolve(mut candidates: Vec<PiiEntity>) -> Vec<PiiEntity> {
    candidates.retain(|c| c.score > 0.0 && c.start < c.end);
    candidates.sort_by(rank);

    let mut accepted: Vec<PiiEntity> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if accepted.iter().all(|kept| !kept.overlaps(&candidate)) {
            accepted.push(candidate);
        }
    }

    accepted.sort_by(|a, b| a.start.cmp(&b.start).then(b.score.total_cmp(&a.score)));
    accepted
}

fn rank(a: &PiiEntity, b: &PiiEntity) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.start.cmp(&b.start))
        .then(b.len().cmp(&a.len()))
        .then_with(|| a.entity_type.cmp(&b.entity_type))
}
