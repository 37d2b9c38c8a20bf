//! Serde helpers for the upstream wire format

/// `YYYY-MM-DD` dates. An ISO datetime is accepted and truncated to its date,
/// since the backend sometimes serializes date columns as midnight UTC.
pub mod date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn parse(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
        let day = raw.trim().get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, FORMAT)
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(|e| de::Error::custom(format!("invalid date '{}': {}", raw, e)))
    }
}
