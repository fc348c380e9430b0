//! Certification Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Technician qualification tag gating which jobs may be requested or started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Certification {
    #[serde(rename = "EV")]
    Ev,
    Engine,
    Brakes,
    Transmission,
    Electrical,
    #[serde(rename = "HVAC")]
    Hvac,
    Diagnostics,
}

impl Certification {
    pub const ALL: [Certification; 7] = [
        Certification::Ev,
        Certification::Engine,
        Certification::Brakes,
        Certification::Transmission,
        Certification::Electrical,
        Certification::Hvac,
        Certification::Diagnostics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Certification::Ev => "EV",
            Certification::Engine => "Engine",
            Certification::Brakes => "Brakes",
            Certification::Transmission => "Transmission",
            Certification::Electrical => "Electrical",
            Certification::Hvac => "HVAC",
            Certification::Diagnostics => "Diagnostics",
        }
    }
}

impl fmt::Display for Certification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Certification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Certification::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown certification: {}", s))
    }
}

/// Certification filter on an incentive rule: every certification, or one specific
///
/// Serialized as `"All"` or the certification name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CertificationScope {
    #[default]
    All,
    #[serde(untagged)]
    Only(Certification),
}

impl CertificationScope {
    /// Whether this scope covers the given certification
    pub fn covers(&self, cert: Certification) -> bool {
        match self {
            CertificationScope::All => true,
            CertificationScope::Only(c) => *c == cert,
        }
    }
}
