use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

use crate::error::AgendaResult;
use crate::store::{Collection, Document};

pub mod activity;
pub mod calendar;
pub mod schedule_request;
pub mod session;
pub mod static_data;

pub const DATE_FORMAT: &[FormatItem] = format_description!("[year]-[month]-[day]");
pub const TIME_FORMAT: &[FormatItem] = format_description!("[hour]:[minute]");

/// An entity stored as a document in one collection.
pub trait Record: DeserializeOwned {
    const COLLECTION: Collection;

    fn from_document(document: Document) -> AgendaResult<Self> {
        serde_json::from_value(document.into_value()?).map_err(Into::into)
    }

    fn from_documents(documents: Vec<Document>) -> AgendaResult<Vec<Self>> {
        documents.into_iter().map(Self::from_document).collect()
    }
}

/// An instant, exchanged as an RFC 3339 string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTime(pub OffsetDateTime);

#[Scalar]
impl ScalarType for DateTime {
    fn parse(value: Value) -> InputValueResult<Self> {
        if let Value::String(date_str) = &value {
            if let Ok(datetime) = OffsetDateTime::parse(date_str, &Rfc3339) {
                return Ok(DateTime(datetime));
            }
        }

        Err(InputValueError::expected_type(value))
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.format(&Rfc3339).unwrap_or_default())
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(datetime: OffsetDateTime) -> Self {
        DateTime(datetime)
    }
}

/// A calendar day, exchanged as `YYYY-MM-DD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateScalar(pub Date);

#[Scalar(name = "Date")]
impl ScalarType for DateScalar {
    fn parse(value: Value) -> InputValueResult<Self> {
        if let Value::String(date_str) = &value {
            if let Ok(date) = Date::parse(date_str, DATE_FORMAT) {
                return Ok(DateScalar(date));
            }
        }

        Err(InputValueError::expected_type(value))
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.format(DATE_FORMAT).unwrap_or_default())
    }
}

/// A time of day, exchanged as `HH:MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeScalar(pub Time);

#[Scalar(name = "Time")]
impl ScalarType for TimeScalar {
    fn parse(value: Value) -> InputValueResult<Self> {
        if let Value::String(time_str) = &value {
            if let Ok(time) = Time::parse(time_str, TIME_FORMAT) {
                return Ok(TimeScalar(time));
            }
        }

        Err(InputValueError::expected_type(value))
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.format(TIME_FORMAT).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime, time};

    use super::*;

    #[test]
    fn scalars_use_their_wire_formats() {
        assert_eq!(
            DateTime(datetime!(2025-12-10 14:30 UTC)).to_value(),
            Value::String("2025-12-10T14:30:00Z".to_owned())
        );
        assert_eq!(
            DateScalar(date!(2025 - 12 - 10)).to_value(),
            Value::String("2025-12-10".to_owned())
        );
        assert_eq!(
            TimeScalar(time!(9:00)).to_value(),
            Value::String("09:00".to_owned())
        );
    }

    #[test]
    fn scalars_reject_other_formats() {
        assert!(DateScalar::parse(Value::String("12/10/2025".to_owned())).is_err());
        assert!(TimeScalar::parse(Value::String("9am".to_owned())).is_err());
        assert!(DateTime::parse(Value::Number(5.into())).is_err());
        assert_eq!(
            TimeScalar::parse(Value::String("22:30".to_owned())).unwrap(),
            TimeScalar(time!(22:30))
        );
    }
}
