use serde::{Deserialize, Serialize};
use std::fmt;

/// A customer cohort defined by purchase frequency.
///
/// The ordering places `HighFrequency` first so keyed collections list the
/// power users before everybody else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Segment {
    HighFrequency,
    Standard,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::HighFrequency => write!(f, "High Frequency"),
            Segment::Standard => write!(f, "Standard"),
        }
    }
}

/// How strongly sales volume reacts to price, judged from a price/quantity correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElasticityClass {
    /// Volume drops noticeably when the price goes up.
    Elastic,
    /// Volume does not fall (or even rises) with price.
    Insensitive,
    Moderate,
}

impl fmt::Display for ElasticityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElasticityClass::Elastic => write!(f, "Elastic (price-sensitive)"),
            ElasticityClass::Insensitive => write!(f, "Insensitive"),
            ElasticityClass::Moderate => write!(f, "Moderate"),
        }
    }
}
