//! Core type definitions with validation.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in time as Unix epoch milliseconds.
pub type Instant = i64;

/// Milliseconds per hour.
pub const MS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Milliseconds per day.
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A name did not match any known variant.
    #[error("unknown {kind}: {value}")]
    UnknownName { kind: &'static str, value: String },

    /// An instant could not be parsed from text.
    #[error("invalid instant: {value} (use epoch ms, YYYY-MM-DD or RFC 3339)")]
    InvalidInstant { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValidationError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated work item identifier.
    ///
    /// Item IDs must be non-empty. Uniqueness within a chart is a caller
    /// precondition and is not checked.
    ItemId, "item ID"
);

define_string_id!(
    /// A validated resource identifier (person, machine, room).
    ResourceId, "resource ID"
);

define_string_id!(
    /// A validated relation group identifier.
    ///
    /// Items sharing a group ID are highlighted together when one is selected.
    GroupId, "group ID"
);

define_string_id!(
    /// A validated marker identifier.
    MarkerId, "marker ID"
);

/// Completion progress in the range \[0.0, 1.0\].
///
/// Values are clamped during deserialization to be lenient with external data.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Progress(f64);

impl Progress {
    /// Fully complete.
    pub const COMPLETE: Self = Self(1.0);

    /// Not started.
    pub const NONE: Self = Self(0.0);

    /// Creates a progress value, clamping to \[0.0, 1.0\].
    ///
    /// NaN becomes 0.0.
    #[must_use]
    pub const fn clamped(value: f64) -> Self {
        if value.is_nan() || value < 0.0 {
            Self(0.0)
        } else if value > 1.0 {
            Self(1.0)
        } else {
            Self(value)
        }
    }

    /// Returns the inner value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}

impl From<Progress> for f64 {
    fn from(p: Progress) -> Self {
        p.0
    }
}

impl Serialize for Progress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Progress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Ok(Self::clamped(value))
    }
}

/// Parses an instant from epoch milliseconds, a `YYYY-MM-DD` date (UTC
/// midnight) or an RFC 3339 timestamp.
pub fn parse_instant(s: &str) -> Result<Instant, ValidationError> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<i64>() {
        return Ok(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc().timestamp_millis());
        }
    }
    Err(ValidationError::InvalidInstant {
        value: s.to_string(),
    })
}

/// Formats an instant as an RFC 3339 UTC timestamp, falling back to the raw
/// millisecond count when out of chrono's range.
pub fn format_instant(t: Instant) -> String {
    DateTime::<Utc>::from_timestamp_millis(t).map_or_else(
        || t.to_string(),
        |dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    )
}

/// Serde helper accepting instants as integers or strings.
///
/// Always serializes as epoch milliseconds.
pub mod instant_serde {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    use super::{Instant, parse_instant};

    pub fn serialize<S>(value: &Instant, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Instant, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(InstantVisitor)
    }

    struct InstantVisitor;

    impl Visitor<'_> for InstantVisitor {
        type Value = Instant;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("epoch milliseconds, a YYYY-MM-DD date or an RFC 3339 timestamp")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Instant, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Instant, E> {
            i64::try_from(v).map_err(|_| E::custom(format!("instant out of range: {v}")))
        }

        #[allow(clippy::cast_possible_truncation)]
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Instant, E> {
            if v.is_finite() {
                Ok(v.round() as i64)
            } else {
                Err(E::custom("instant must be finite"))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Instant, E> {
            parse_instant(v).map_err(E::custom)
        }
    }

    /// The same forms for an optional field. `null` reads as `None`.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::Instant;

        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "super")] Instant);

        #[allow(clippy::ref_option)]
        pub fn serialize<S>(value: &Option<Instant>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(t) => serializer.serialize_some(t),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Instant>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(t)| t))
        }
    }
}

/// Serde helpers for references to other entities.
///
/// Blank strings are a common "no reference" value in external data, so they
/// read as absent rather than failing ID validation.
pub mod optional_id {
    use serde::{Deserialize, Deserializer, de};

    use super::ValidationError;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<String, Error = ValidationError>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => {
                T::try_from(raw).map(Some).map_err(de::Error::custom)
            }
            _ => Ok(None),
        }
    }

    /// A list of references with blank entries dropped.
    pub fn deserialize_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<String, Error = ValidationError>,
    {
        let raw = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
        raw.into_iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| T::try_from(s).map_err(de::Error::custom))
            .collect()
    }
}
