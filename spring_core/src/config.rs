//! # Spring Configuration
//!
//! The closed enumerations that select which equations and checks apply to a
//! spring: end-coil treatment ([`Ending`]), end-support condition
//! ([`Fixing`]) and the wire material identifier.
//!
//! ## Example
//!
//! ```rust
//! use spring_core::config::{Ending, Fixing, SpringConfig};
//!
//! let config = SpringConfig::parse("closed-ground", "fix pivot", "A227").unwrap();
//! assert_eq!(config.ending, Ending::ClosedGround);
//! assert_eq!(config.fixing, Fixing::FixPivot);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{SpringError, SpringResult};

/// Default solve deadline in seconds
pub const DEFAULT_DEADLINE_SECS: f64 = 30.0;

/// Default wire material
pub const DEFAULT_MATERIAL: &str = "A229";

fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace([' ', '_'], "-")
}

/// End-coil treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Ending {
    /// Closed and ground ends
    #[default]
    ClosedGround,
    /// Closed, unground ends
    Closed,
    /// Open and ground ends
    OpenGround,
    /// Plain open ends
    Open,
}

impl Ending {
    pub const ALL: [Ending; 4] =
        [Ending::ClosedGround, Ending::Closed, Ending::OpenGround, Ending::Open];

    pub fn code(&self) -> &'static str {
        match self {
            Ending::ClosedGround => "closed-ground",
            Ending::Closed => "closed",
            Ending::OpenGround => "open-ground",
            Ending::Open => "open",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> SpringResult<Self> {
        match normalize(s).as_str() {
            "closed-ground" | "closed-and-ground" => Ok(Ending::ClosedGround),
            "closed" => Ok(Ending::Closed),
            "open-ground" | "open-and-ground" => Ok(Ending::OpenGround),
            "open" => Ok(Ending::Open),
            _ => Err(SpringError::invalid_option("ending", s, &Self::ALL.map(|e| e.code()))),
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Ending::ClosedGround => "Closed and ground",
            Ending::Closed => "Closed",
            Ending::OpenGround => "Open and ground",
            Ending::Open => "Open",
        }
    }
}

impl std::fmt::Display for Ending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// End-support condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Fixing {
    /// Both ends fixed between parallel plates
    #[default]
    FixParallel,
    /// One end fixed, the other pivoting
    FixPivot,
    /// Both ends pivoting
    BothPivot,
    /// One end clamped, the other free
    HingedFree,
}

impl Fixing {
    pub const ALL: [Fixing; 4] =
        [Fixing::FixParallel, Fixing::FixPivot, Fixing::BothPivot, Fixing::HingedFree];

    pub fn code(&self) -> &'static str {
        match self {
            Fixing::FixParallel => "fix-parallel",
            Fixing::FixPivot => "fix-pivot",
            Fixing::BothPivot => "both-pivot",
            Fixing::HingedFree => "hinged-free",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> SpringResult<Self> {
        match normalize(s).as_str() {
            "fix-parallel" | "fixed-parallel" => Ok(Fixing::FixParallel),
            "fix-pivot" | "fixed-pivot" => Ok(Fixing::FixPivot),
            "both-pivot" => Ok(Fixing::BothPivot),
            "hinged-free" | "clamped-free" => Ok(Fixing::HingedFree),
            _ => Err(SpringError::invalid_option("fixing", s, &Self::ALL.map(|f| f.code()))),
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Fixing::FixParallel => "Both ends fixed, parallel plates",
            Fixing::FixPivot => "One end fixed, other pivots",
            Fixing::BothPivot => "Both ends pivot",
            Fixing::HingedFree => "One end clamped, other free",
        }
    }

    /// End-condition constant α for the buckling length limit
    pub fn buckling_alpha(&self) -> f64 {
        match self {
            Fixing::FixParallel => 0.5,
            Fixing::FixPivot => 0.707,
            Fixing::BothPivot => 1.0,
            Fixing::HingedFree => 2.0,
        }
    }

    /// Natural-frequency divisor for the maximum operating frequency
    pub fn frequency_divisor(&self) -> f64 {
        match self {
            Fixing::FixParallel | Fixing::BothPivot => 13.0,
            Fixing::FixPivot | Fixing::HingedFree => 26.0,
        }
    }
}

impl std::fmt::Display for Fixing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Configuration fixed at spring construction.
///
/// The material identifier is only checked against the property store when
/// the spring is built, since the store is supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpringConfig {
    pub ending: Ending,
    pub fixing: Fixing,
    pub material: String,
}

impl SpringConfig {
    pub fn new(ending: Ending, fixing: Fixing, material: impl Into<String>) -> Self {
        Self {
            ending,
            fixing,
            material: material.into(),
        }
    }

    /// Parse string options; fails with `InvalidOption` on the first bad value
    pub fn parse(ending: &str, fixing: &str, material: &str) -> SpringResult<Self> {
        Ok(Self {
            ending: Ending::from_str_flexible(ending)?,
            fixing: Fixing::from_str_flexible(fixing)?,
            material: material.trim().to_string(),
        })
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::new(Ending::default(), Fixing::default(), DEFAULT_MATERIAL)
    }
}
