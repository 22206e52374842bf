use serde::{Deserialize, Serialize};
use time::Date;

pub type TaskId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    #[serde(with = "date_key_serde")]
    pub date: Date,
}

impl Task {
    pub fn new(id: TaskId, text: impl Into<String>, date: Date) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            date,
        }
    }

    pub fn into_completed(mut self) -> Self {
        self.completed = true;
        self
    }
}

// Dates are persisted as `YYYY-MM-DD` strings.
mod date_key_serde {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use time::Date;

    use crate::domain::dates::{date_key, parse_date_key};

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date_key(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date_key(&raw).ok_or_else(|| D::Error::custom(format!("invalid date key `{raw}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn serializes_to_persisted_record_layout() {
        let task = Task::new(1_700_000_000_000, "Buy milk", date!(2026 - 10 - 19));
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 1_700_000_000_000_i64,
                "text": "Buy milk",
                "completed": false,
                "date": "2026-10-19"
            })
        );
    }

    #[test]
    fn rejects_records_with_bad_dates() {
        let raw = r#"{"id":1,"text":"x","completed":false,"date":"19/10/2026"}"#;
        assert!(serde_json::from_str::<Task>(raw).is_err());

        let missing = r#"{"id":1,"text":"x","completed":false}"#;
        assert!(serde_json::from_str::<Task>(missing).is_err());
    }
}
