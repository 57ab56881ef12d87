use thiserror::Error;

/// Failures surfaced by a tally store backend.
///
/// Any of these aborts the operation before memory is touched.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record that may be written only once already exists, such as a second vote by the
    /// same voter or a reused batch id.
    #[error("record already stored: {0}")]
    Duplicate(String),

    #[error("store backend failed: {0}")]
    Backend(String),

    #[error("could not encode or decode record: {0}")]
    Serialization(String),

    /// A stored record is unreadable or contradicts another record.
    #[error("stored tally data is corrupted: {0}")]
    Corruption(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_record() {
        let err = StoreError::Duplicate("vote of alice".into());
        assert_eq!(err.to_string(), "record already stored: vote of alice");
        let err = StoreError::Corruption("candidate 3 of constituency 7".into());
        assert_eq!(
            err.to_string(),
            "stored tally data is corrupted: candidate 3 of constituency 7"
        );
    }
}
