//! Upstream server region.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Game server region. Selects which upstream hosts are queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Eu,
    Na,
    Cis,
    Asia,
}

impl Region {
    /// Parse a region from its configuration string.
    ///
    /// `RU` is accepted as an alias for `CIS`.
    pub fn from_config_str(s: &str) -> Option<Self> {
        match s {
            "EU" => Some(Self::Eu),
            "NA" => Some(Self::Na),
            "CIS" | "RU" => Some(Self::Cis),
            "ASIA" => Some(Self::Asia),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eu => "EU",
            Self::Na => "NA",
            Self::Cis => "CIS",
            Self::Asia => "ASIA",
        }
    }

    /// Top-level domain of the region's game sites.
    pub const fn tld(&self) -> &'static str {
        match self {
            Self::Eu => "eu",
            Self::Na => "com",
            Self::Cis => "ru",
            Self::Asia => "asia",
        }
    }

    /// Default base URL of the account (vortex) API.
    pub fn vortex_base_url(&self) -> String {
        format!("https://vortex.worldofwarships.{}", self.tld())
    }

    /// Default base URL of the public search API.
    pub fn api_base_url(&self) -> String {
        format!("https://api.worldofwarships.{}", self.tld())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
