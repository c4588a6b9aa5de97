//! The four Sunni schools of jurisprudence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Madhab {
    Hanafi,
    Maliki,
    Shafii,
    Hanbali,
}

impl Madhab {
    pub const ALL: [Madhab; 4] = [Madhab::Hanafi, Madhab::Maliki, Madhab::Shafii, Madhab::Hanbali];

    pub fn code(&self) -> &'static str {
        match self {
            Madhab::Hanafi => "hanafi",
            Madhab::Maliki => "maliki",
            Madhab::Shafii => "shafii",
            Madhab::Hanbali => "hanbali",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Madhab::Hanafi => "Hanafi",
            Madhab::Maliki => "Maliki",
            Madhab::Shafii => "Shafi'i",
            Madhab::Hanbali => "Hanbali",
        }
    }

    /// Case-insensitive lookup; accepts the common transliterations of Shafi'i.
    pub fn from_code(code: &str) -> Result<Madhab, ValidationError> {
        match code.trim().to_ascii_lowercase().as_str() {
            "hanafi" => Ok(Madhab::Hanafi),
            "maliki" => Ok(Madhab::Maliki),
            "shafii" | "shafi'i" | "shafi" => Ok(Madhab::Shafii),
            "hanbali" => Ok(Madhab::Hanbali),
            _ => Err(ValidationError::UnknownMadhab {
                code: code.to_string(),
            }),
        }
    }
}

impl fmt::Display for Madhab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Madhab {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Madhab::from_code(s)
    }
}
