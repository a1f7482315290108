//! CEFR proficiency levels and language variants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Common European Framework of Reference proficiency band.
///
/// Ordered: `A1 < A2 < B1 < B2 < C1 < C2`. The ordering is used by the
/// selection engines for difficulty-band fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    /// Beginner.
    A1,
    /// Elementary.
    A2,
    /// Intermediate.
    B1,
    /// Upper intermediate.
    B2,
    /// Advanced.
    C1,
    /// Proficient.
    C2,
}

impl CefrLevel {
    /// All levels in ascending order.
    pub const ALL: [Self; 6] = [Self::A1, Self::A2, Self::B1, Self::B2, Self::C1, Self::C2];

    /// Zero-based index within the A1–C2 scale.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::A1 => 0,
            Self::A2 => 1,
            Self::B1 => 2,
            Self::B2 => 3,
            Self::C1 => 4,
            Self::C2 => 5,
        }
    }

    /// String form (`"A1"` … `"C2"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CefrLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A1" | "a1" => Ok(Self::A1),
            "A2" | "a2" => Ok(Self::A2),
            "B1" | "b1" => Ok(Self::B1),
            "B2" | "b2" => Ok(Self::B2),
            "C1" | "c1" => Ok(Self::C1),
            "C2" | "c2" => Ok(Self::C2),
            _ => Err(UnknownLevel(s.to_owned())),
        }
    }
}

/// Error for an unrecognized CEFR level string.
#[derive(Debug, thiserror::Error)]
#[error("unknown CEFR level: {0}")]
pub struct UnknownLevel(pub String);

/// Target-language variant a course is written for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageVariant {
    /// American English.
    #[default]
    AmericanEnglish,
    /// British English.
    BritishEnglish,
    /// Australian English.
    AustralianEnglish,
    /// Canadian English.
    CanadianEnglish,
}

impl LanguageVariant {
    /// String form used in persistence and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AmericanEnglish => "american_english",
            Self::BritishEnglish => "british_english",
            Self::AustralianEnglish => "australian_english",
            Self::CanadianEnglish => "canadian_english",
        }
    }
}

impl fmt::Display for LanguageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "american_english" => Ok(Self::AmericanEnglish),
            "british_english" => Ok(Self::BritishEnglish),
            "australian_english" => Ok(Self::AustralianEnglish),
            "canadian_english" => Ok(Self::CanadianEnglish),
            other => Err(format!("unknown language variant: {other}")),
        }
    }
}

/// Coarse difficulty band derived from a unit's position in its book.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionLevel {
    /// First three units of a book.
    #[default]
    Basic,
    /// Units four through seven.
    Intermediate,
    /// Everything after.
    Advanced,
}

impl ProgressionLevel {
    /// Band for a 1-based unit sequence number.
    #[must_use]
    pub fn from_sequence(sequence_order: i64) -> Self {
        if sequence_order <= 3 {
            Self::Basic
        } else if sequence_order <= 7 {
            Self::Intermediate
        } else {
            Self::Advanced
        }
    }

    /// String form used in prompts and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ProgressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(CefrLevel::A1 < CefrLevel::C2);
        assert!(CefrLevel::B1 < CefrLevel::B2);
        for (i, level) in CefrLevel::ALL.iter().enumerate() {
            assert_eq!(level.index(), i);
        }
    }

    #[test]
    fn progression_bands_follow_sequence() {
        assert_eq!(ProgressionLevel::from_sequence(1), ProgressionLevel::Basic);
        assert_eq!(ProgressionLevel::from_sequence(3), ProgressionLevel::Basic);
        assert_eq!(
            ProgressionLevel::from_sequence(4),
            ProgressionLevel::Intermediate
        );
        assert_eq!(
            ProgressionLevel::from_sequence(7),
            ProgressionLevel::Intermediate
        );
        assert_eq!(ProgressionLevel::from_sequence(8), ProgressionLevel::Advanced);
    }

    #[test]
    fn round_trips_from_str() {
        for level in CefrLevel::ALL {
            assert_eq!(level.as_str().parse::<CefrLevel>().unwrap(), level);
        }
        assert!("D1".parse::<CefrLevel>().is_err());
    }
}
