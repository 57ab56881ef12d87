//! Input-shape checks shared by every tier that accepts a lower tier's result.

use tally_types::CandidateId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("vote vector mismatch: {0}")]
    VectorMismatch(String),

    #[error("declared total {declared} does not match vote sum {counted}")]
    TotalMismatch { declared: u64, counted: u128 },
}

/// Check a submitted vote vector against the expected candidate list and its declared
/// total. Both the declared total and the vector are kept; neither is derived from the
/// other.
pub fn check_submission(
    expected: &[CandidateId],
    candidate_ids: &[CandidateId],
    votes: &[u64],
    declared_total: u64,
) -> Result<(), ShapeError> {
    if candidate_ids.len() != votes.len() {
        return Err(ShapeError::VectorMismatch(format!(
            "{} candidate ids but {} vote counts",
            candidate_ids.len(),
            votes.len()
        )));
    }
    if candidate_ids != expected {
        return Err(ShapeError::VectorMismatch(format!(
            "candidates {candidate_ids:?} differ from expected {expected:?}"
        )));
    }
    let counted: u128 = votes.iter().map(|&v| u128::from(v)).sum();
    if counted != u128::from(declared_total) {
        return Err(ShapeError::TotalMismatch {
            declared: declared_total,
            counted,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE: [CandidateId; 5] = [1, 2, 3, 4, 5];

    #[test]
    fn matching_vector_and_total_accepted() {
        assert_eq!(check_submission(&FIVE, &FIVE, &[3, 2, 2, 2, 1], 10), Ok(()));
    }

    #[test]
    fn wrong_total_rejected() {
        assert_eq!(
            check_submission(&FIVE, &FIVE, &[3, 2, 2, 2, 1], 9),
            Err(ShapeError::TotalMismatch {
                declared: 9,
                counted: 10
            })
        );
    }

    #[test]
    fn length_and_candidate_set_checked() {
        assert!(matches!(
            check_submission(&FIVE, &FIVE, &[3, 2, 2, 2], 9),
            Err(ShapeError::VectorMismatch(_))
        ));
        assert!(matches!(
            check_submission(&FIVE, &[1, 2, 3, 4, 6], &[3, 2, 2, 2, 1], 10),
            Err(ShapeError::VectorMismatch(_))
        ));
    }

    #[test]
    fn overflowing_vector_cannot_match() {
        assert!(matches!(
            check_submission(&[1, 2], &[1, 2], &[u64::MAX, 1], 0),
            Err(ShapeError::TotalMismatch { .. })
        ));
    }
}
