use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Sunday,
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Sunday => "Sunday",
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
        }
    }

    pub fn short(self) -> &'static str {
        &self.as_str()[..3]
    }

    pub fn from_weekday(weekday: time::Weekday) -> Self {
        match weekday {
            time::Weekday::Sunday => Day::Sunday,
            time::Weekday::Monday => Day::Monday,
            time::Weekday::Tuesday => Day::Tuesday,
            time::Weekday::Wednesday => Day::Wednesday,
            time::Weekday::Thursday => Day::Thursday,
            time::Weekday::Friday => Day::Friday,
            time::Weekday::Saturday => Day::Saturday,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = ParseDayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let day = match normalized.as_str() {
            "sunday" | "sun" => Day::Sunday,
            "monday" | "mon" => Day::Monday,
            "tuesday" | "tue" | "tues" => Day::Tuesday,
            "wednesday" | "wed" => Day::Wednesday,
            "thursday" | "thu" | "thurs" => Day::Thursday,
            "friday" | "fri" => Day::Friday,
            "saturday" | "sat" => Day::Saturday,
            _ => {
                return Err(ParseDayError {
                    value: value.to_string(),
                })
            }
        };
        Ok(day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid day '{value}': expected a weekday name such as monday or mon")]
pub struct ParseDayError {
    value: String,
}

/// One hour of the day, always within `0..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Hour(u8);

impl Hour {
    pub const COUNT: u8 = 24;

    pub fn new(value: u8) -> Result<Self, ParseHourError> {
        if value < Self::COUNT {
            Ok(Self(value))
        } else {
            Err(ParseHourError {
                value: value.to_string(),
            })
        }
    }

    /// Reduces any clock hour into range.
    pub fn wrapping(value: u8) -> Self {
        Self(value % Self::COUNT)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Hour> {
        (0..Self::COUNT).map(Hour)
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl FromStr for Hour {
    type Err = ParseHourError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = trimmed.strip_suffix(":00").unwrap_or(trimmed);
        let parsed = digits.parse::<u8>().map_err(|_| ParseHourError {
            value: value.to_string(),
        })?;
        Hour::new(parsed).map_err(|_| ParseHourError {
            value: value.to_string(),
        })
    }
}

impl TryFrom<u8> for Hour {
    type Error = ParseHourError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Hour::new(value)
    }
}

impl From<Hour> for u8 {
    fn from(value: Hour) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hour '{value}': expected 0-23")]
pub struct ParseHourError {
    value: String,
}
