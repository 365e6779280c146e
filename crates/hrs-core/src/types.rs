//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for user input and stored entries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A session cannot start without a project and a task.
    #[error("project and task required")]
    ProjectAndTaskRequired,

    /// The project is not known to the project directory.
    #[error("unknown project: {id}")]
    UnknownProject { id: String },

    /// A duration below zero was supplied.
    #[error("duration cannot be negative, got {minutes} minutes")]
    NegativeDuration { minutes: i64 },

    /// A duration too large to store was supplied.
    #[error("duration of {minutes} minutes is too large")]
    DurationTooLarge { minutes: i64 },

    /// A manual entry needs either a duration or both start and end times.
    #[error("duration or start and end times required")]
    MissingDuration,

    /// The end time precedes the start time.
    #[error("end time {end} is before start time {start}")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The supplied duration disagrees with the start and end times.
    #[error("duration of {given} minutes does not match start/end span of {computed} minutes")]
    DurationMismatch { given: i64, computed: i64 },

    /// Start and end must both be present or both absent.
    #[error("start and end times must be given together")]
    IncompleteTimeRange,

    /// Start and end times must fall on whole minutes.
    #[error("start and end times must be whole minutes")]
    SubMinuteTimeRange,

    /// Hourly rates cannot be negative.
    #[error("hourly rate cannot be negative, got {rate}")]
    NegativeRate { rate: Money },

    /// Flipping an entry to billable needs an explicit rate.
    #[error("a rate is required when marking an entry billable")]
    RateRequired,

    /// A rate was supplied on an edit that does not make the entry billable.
    #[error("a rate can only be supplied when marking an entry billable")]
    RateWithoutBillableChange,

    /// A billable entry is missing its rate snapshot.
    #[error("billable entries must carry a rate")]
    BillableWithoutRate,

    /// A non-billable entry carries a rate.
    #[error("non-billable entries cannot carry a rate")]
    RateOnNonBillable,

    /// A monetary amount could not be parsed.
    #[error("invalid amount: {value}")]
    InvalidMoney { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
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

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
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
    };
}

define_string_id!(
    /// A validated time entry identifier.
    ///
    /// Assigned by the timesheet when an entry is stored.
    EntryId, "entry ID"
);

define_string_id!(
    /// A validated project identifier.
    ProjectId, "project ID"
);

define_string_id!(
    /// A validated user identifier.
    ///
    /// Entries, projects and the active session are all scoped per user.
    UserId, "user ID"
);

impl EntryId {
    /// Generates a fresh random entry ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// A monetary amount in whole cents.
///
/// Serialized as an integer number of cents so stored values never pick up
/// floating-point error.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from whole cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the amount in whole cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns true if the amount is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns an error if the amount is not a valid hourly rate.
    pub fn validate_rate(self) -> Result<Self, ValidationError> {
        if self.is_negative() {
            return Err(ValidationError::NegativeRate { rate: self });
        }
        Ok(self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    /// Parses `50`, `50.5`, `50.25`, optionally prefixed with `-` or `$`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidMoney {
            value: s.to_string(),
        };

        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);

        let (whole, frac) = match rest.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (rest, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if rest.ends_with('.') {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or_else(invalid)?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}
