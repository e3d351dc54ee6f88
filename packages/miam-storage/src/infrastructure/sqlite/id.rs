//! External string ids <-> SQLite integer row ids

use crate::error::{Result, StorageError};

/// Parse an external id; non-numeric input is an `InvalidValue`.
pub fn to_sqlite_id(id: &str) -> Result<i64> {
    id.parse::<i64>()
        .map_err(|err| StorageError::invalid_value(format!("invalid id [{}]", id)).with_source(err))
}

pub fn from_sqlite_id(id: i64) -> String {
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_numeric_ids() {
        assert_eq!(to_sqlite_id("42").unwrap(), 42);
        assert_eq!(from_sqlite_id(42), "42");
        assert_eq!(to_sqlite_id(&from_sqlite_id(7)).unwrap(), 7);
    }

    #[test]
    fn test_malformed_ids() {
        for id in ["", "abc", "1.5", " 3", "99999999999999999999"] {
            let err = to_sqlite_id(id).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidValue, "id {:?}", id);
        }
    }

    #[test]
    fn test_message_names_the_id() {
        let err = to_sqlite_id("x1").unwrap_err();
        assert_eq!(err.message, "invalid id [x1]");
    }
}
