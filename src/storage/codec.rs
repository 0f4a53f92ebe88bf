use thiserror::Error;

use crate::domain::{ExpenseRecord, RecordError, check_records};

/// Errors reading the persisted record sequence.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("stored expenses are not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("stored expenses are inconsistent: {0}")]
    Invalid(#[from] RecordError),
}

/// Serialize the record sequence (newest first) for storage.
pub fn encode_records(records: &[ExpenseRecord]) -> serde_json::Result<String> {
    serde_json::to_string(records)
}

/// Deserialize a stored record sequence, keeping its order.
/// Any record that breaks an invariant rejects the whole blob.
pub fn decode_records(blob: &str) -> Result<Vec<ExpenseRecord>, PersistenceError> {
    let records: Vec<ExpenseRecord> = serde_json::from_str(blob)?;
    check_records(&records)?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;

    fn records() -> Vec<ExpenseRecord> {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        vec![
            ExpenseRecord::new(
                2,
                "Taxi",
                dec!(85),
                date,
                Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap(),
            ),
            ExpenseRecord::new(
                1,
                "Lunch",
                dec!(120.75),
                date,
                Utc.timestamp_millis_opt(1_736_913_906_789).unwrap(),
            ),
        ]
    }

    #[test]
    fn test_round_trip_preserves_order_and_fields() {
        let original = records();
        let blob = encode_records(&original).unwrap();
        let decoded = decode_records(&blob).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_empty_sequence() {
        assert_eq!(encode_records(&[]).unwrap(), "[]");
        assert!(decode_records("[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_garbage() {
        for blob in ["", "not json", "{\"id\": 1}", "[{\"id\": \"x\"}]", "[1, 2, 3]", "null"] {
            assert!(
                matches!(decode_records(blob), Err(PersistenceError::Malformed(_))),
                "blob {:?} should be malformed",
                blob
            );
        }
    }

    #[test]
    fn test_decode_rejects_broken_invariants() {
        let negative = r#"[{"id":1,"name":"Coffee","amount":-5,"date":"2025-01-15","timestamp":"2025-01-15T00:00:00Z"}]"#;
        assert!(matches!(
            decode_records(negative),
            Err(PersistenceError::Invalid(RecordError::NonPositiveAmount { .. }))
        ));

        let duplicate = r#"[
            {"id":1,"name":"A","amount":1,"date":"2025-01-15","timestamp":"2025-01-15T00:00:00Z"},
            {"id":1,"name":"B","amount":2,"date":"2025-01-15","timestamp":"2025-01-15T00:00:00Z"}
        ]"#;
        assert!(matches!(
            decode_records(duplicate),
            Err(PersistenceError::Invalid(RecordError::DuplicateId(1)))
        ));
    }

    #[test]
    fn test_decode_browser_blob() {
        // As written by the browser version
        let blob = r#"[
            {"id":1736913950000,"name":"Taxi","amount":85,"date":"2025/1/15","timestamp":"2025-01-15T04:05:50.000Z"},
            {"id":1736913906789,"name":"Lunch","amount":120,"date":"2025/1/15","timestamp":"2025-01-15T04:05:06.789Z"}
        ]"#;

        let decoded = decode_records(blob).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].name, "Taxi");
        assert_eq!(decoded[0].amount, dec!(85));
        assert_eq!(decoded[1].amount, dec!(120));
        assert_eq!(decoded[1].date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }

    #[test]
    fn test_decode_keeps_sub_cent_amounts() {
        let blob = r#"[
            {"id":2,"name":"Gum","amount":0.004,"date":"2025/1/15","timestamp":"2025-01-15T04:05:50.000Z"},
            {"id":1,"name":"Lunch","amount":120,"date":"2025/1/15","timestamp":"2025-01-15T04:05:06.789Z"}
        ]"#;

        let decoded = decode_records(blob).unwrap();
        assert_eq!(decoded[0].amount, dec!(0.004));

        let encoded = encode_records(&decoded).unwrap();
        assert!(encoded.contains("\"amount\":0.004"));
        assert_eq!(decode_records(&encoded).unwrap(), decoded);
    }
}
