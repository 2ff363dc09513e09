use chrono::{DateTime, NaiveDate, Utc};
use qa_core::error::ReviewError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("json encode failed: {message}")]
    JsonEncode { message: String },
    #[error("json decode failed: {message}")]
    JsonDecode { message: String },
    #[error("invalid enum value: {value}")]
    InvalidEnum { value: String },
    #[error("invalid timestamp: {value}")]
    InvalidTimestamp { value: String },
    #[error("invalid date: {value}")]
    InvalidDate { value: String },
    #[error("value out of range: {value}")]
    OutOfRange { value: String },
}

impl From<DbError> for ReviewError {
    fn from(err: DbError) -> Self {
        ReviewError::storage(err)
    }
}

pub fn to_rfc3339(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub fn from_rfc3339(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DbError::InvalidTimestamp {
            value: value.to_string(),
        })
}

pub fn to_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub fn from_date(value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DbError::InvalidDate {
        value: value.to_string(),
    })
}

pub fn version_to_sql(version: u64) -> Result<i64, DbError> {
    i64::try_from(version).map_err(|_| DbError::OutOfRange {
        value: version.to_string(),
    })
}

pub fn version_from_sql(version: i64) -> Result<u64, DbError> {
    u64::try_from(version).map_err(|_| DbError::OutOfRange {
        value: version.to_string(),
    })
}

pub fn encode_json<T: Serialize>(value: &T) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(|err| DbError::JsonEncode {
        message: err.to_string(),
    })
}

pub fn decode_json<T: DeserializeOwned>(value: &str) -> Result<T, DbError> {
    serde_json::from_str(value).map_err(|err| DbError::JsonDecode {
        message: err.to_string(),
    })
}

pub fn encode_enum<T: Serialize>(value: &T) -> Result<String, DbError> {
    let json = serde_json::to_value(value).map_err(|err| DbError::JsonEncode {
        message: err.to_string(),
    })?;
    match json {
        Value::String(value) => Ok(value),
        other => Err(DbError::InvalidEnum {
            value: other.to_string(),
        }),
    }
}

pub fn decode_enum<T: DeserializeOwned>(value: &str) -> Result<T, DbError> {
    let json = Value::String(value.to_string());
    serde_json::from_value(json).map_err(|_| DbError::InvalidEnum {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core::status::WorkflowStatus;
    use qa_core::types::Grade;

    #[test]
    fn enums_are_stored_as_their_serde_names() {
        assert_eq!(
            encode_enum(&WorkflowStatus::SubmittedForVerification).unwrap(),
            "submitted_for_verification"
        );
        assert_eq!(encode_enum(&Grade::Four).unwrap(), "4");
        let status: WorkflowStatus = decode_enum("verified_pending_final").unwrap();
        assert_eq!(status, WorkflowStatus::VerifiedPendingFinal);
        assert!(matches!(
            decode_enum::<WorkflowStatus>("approved"),
            Err(DbError::InvalidEnum { .. })
        ));
    }

    #[test]
    fn dates_use_iso_format() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 9).unwrap();
        assert_eq!(to_date(&date), "2026-02-09");
        assert_eq!(from_date("2026-02-09").unwrap(), date);
        assert!(from_date("09/02/2026").is_err());
    }

    #[test]
    fn negative_versions_are_rejected() {
        assert!(version_from_sql(-1).is_err());
        assert_eq!(version_to_sql(3).unwrap(), 3);
    }
}
