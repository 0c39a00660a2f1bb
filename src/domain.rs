//! Core risk vocabulary: scoring, enumerations and monetary values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Lowest value accepted for severity, likelihood and impact
pub const SCORE_MIN: i64 = 1;
/// Highest value accepted for severity, likelihood and impact
pub const SCORE_MAX: i64 = 10;

/// Risk score as likelihood × impact / 2
pub fn risk_score(likelihood: i64, impact: i64) -> f64 {
    (likelihood * impact) as f64 / 2.0
}

/// Whether a rating lies within [`SCORE_MIN`, `SCORE_MAX`]
pub fn in_score_range(value: i64) -> bool {
    (SCORE_MIN..=SCORE_MAX).contains(&value)
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Lifecycle status of a risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    #[default]
    Identified,
    Assessed,
    Mitigated,
    Accepted,
    Transferred,
}

impl RiskStatus {
    pub const ALL: [RiskStatus; 5] = [
        RiskStatus::Identified,
        RiskStatus::Assessed,
        RiskStatus::Mitigated,
        RiskStatus::Accepted,
        RiskStatus::Transferred,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identified => "identified",
            Self::Assessed => "assessed",
            Self::Mitigated => "mitigated",
            Self::Accepted => "accepted",
            Self::Transferred => "transferred",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Identified => "Identified",
            Self::Assessed => "Assessed",
            Self::Mitigated => "Mitigated",
            Self::Accepted => "Accepted",
            Self::Transferred => "Transferred",
        }
    }
}

impl FromStr for RiskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "risk status",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of a threat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ThreatType {
    External,
    Internal,
    Natural,
    Human,
    Technical,
}

impl ThreatType {
    pub const ALL: [ThreatType; 5] = [
        ThreatType::External,
        ThreatType::Internal,
        ThreatType::Natural,
        ThreatType::Human,
        ThreatType::Technical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Internal => "internal",
            Self::Natural => "natural",
            Self::Human => "human",
            Self::Technical => "technical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::External => "External",
            Self::Internal => "Internal",
            Self::Natural => "Natural",
            Self::Human => "Human",
            Self::Technical => "Technical",
        }
    }
}

impl FromStr for ThreatType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "threat type",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ThreatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Treatment chosen for a risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Mitigate,
    Accept,
    Transfer,
    Avoid,
}

impl ResponseType {
    pub const ALL: [ResponseType; 4] = [
        ResponseType::Mitigate,
        ResponseType::Accept,
        ResponseType::Transfer,
        ResponseType::Avoid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mitigate => "mitigate",
            Self::Accept => "accept",
            Self::Transfer => "transfer",
            Self::Avoid => "avoid",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mitigate => "Mitigate",
            Self::Accept => "Accept",
            Self::Transfer => "Transfer",
            Self::Avoid => "Avoid",
        }
    }
}

impl FromStr for ResponseType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "response type",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a monetary amount was rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Enter a number.")]
    Invalid,
    #[error("Asset value cannot be negative.")]
    Negative,
    #[error("Ensure that there are no more than {max} decimal places.", max = Money::DECIMAL_PLACES)]
    TooManyDecimals,
    #[error("Ensure that there are no more than {max} digits in total.", max = Money::MAX_DIGITS)]
    TooManyDigits,
}

/// Non-negative decimal amount with two fractional digits, held as cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Money(i64);

impl Money {
    pub const MAX_DIGITS: usize = 10;
    pub const DECIMAL_PLACES: usize = 2;

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(MoneyError::Invalid);
        }

        let whole = whole.trim_start_matches('0');
        let frac = frac.trim_end_matches('0');
        let cents = whole
            .chars()
            .chain(frac.chars().chain(std::iter::repeat('0')).take(Self::DECIMAL_PLACES))
            .try_fold(0i64, |acc, c| {
                acc.checked_mul(10)?
                    .checked_add(i64::from(c.to_digit(10)?))
            });

        if negative && cents.is_some_and(|c| c != 0) {
            return Err(MoneyError::Negative);
        }
        if frac.len() > Self::DECIMAL_PLACES {
            return Err(MoneyError::TooManyDecimals);
        }
        if whole.len() > Self::MAX_DIGITS - Self::DECIMAL_PLACES {
            return Err(MoneyError::TooManyDigits);
        }

        cents.map(Self).ok_or(MoneyError::TooManyDigits)
    }
}

impl Serialize for Money {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
