//! # Spring Parameters
//!
//! The named physical quantities of a helical spring and their tri-state
//! resolution: a parameter is absent (not tracked), [`ParamValue::Unresolved`],
//! or [`ParamValue::Resolved`] with a finite value.
//!
//! All lengths are in millimeters, mass in kilograms, frequency in Hertz and
//! rate in N/mm (N·mm/deg for torsion springs).
//!
//! ## Example
//!
//! ```rust
//! use spring_core::params::{ParamName, ParameterSet};
//!
//! let mut params = ParameterSet::all_unresolved();
//! params.set(ParamName::D, 1.0);
//! assert_eq!(params.value(ParamName::D), Some(1.0));
//! assert!(params.unresolved().contains(&ParamName::De));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{SpringError, SpringResult};

/// Numeric values keyed by parameter, as exchanged with the solver
pub type Bindings = BTreeMap<ParamName, f64>;

/// Physical quantities tracked for every spring.
///
/// Declaration order is significant: it is the deterministic order used by
/// the solver when choosing which unknown to eliminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamName {
    /// Wire diameter (gauge)
    #[serde(rename = "d")]
    D,
    /// External coil diameter
    #[serde(rename = "DE")]
    De,
    /// Medium (mean) coil diameter
    #[serde(rename = "DM")]
    Dm,
    /// Internal coil diameter
    #[serde(rename = "DI")]
    Di,
    /// Total turns
    #[serde(rename = "Nt")]
    Nt,
    /// Active turns
    #[serde(rename = "Na")]
    Na,
    /// Pitch
    #[serde(rename = "p")]
    P,
    /// Clearance between adjacent coils
    #[serde(rename = "gap")]
    Gap,
    /// Free length
    #[serde(rename = "Lo")]
    Lo,
    /// Solid length
    #[serde(rename = "Ls")]
    Ls,
    /// Spring index DM/d
    #[serde(rename = "C")]
    C,
    /// Mass
    #[serde(rename = "w")]
    W,
    /// Natural frequency
    #[serde(rename = "fn")]
    Fn,
    /// Spring rate
    #[serde(rename = "k")]
    K,
}

impl ParamName {
    /// Every parameter, in solver order
    pub const ALL: [ParamName; 14] = [
        ParamName::D,
        ParamName::De,
        ParamName::Dm,
        ParamName::Di,
        ParamName::Nt,
        ParamName::Na,
        ParamName::P,
        ParamName::Gap,
        ParamName::Lo,
        ParamName::Ls,
        ParamName::C,
        ParamName::W,
        ParamName::Fn,
        ParamName::K,
    ];

    /// Symbol used in inputs, outputs and equations
    pub fn symbol(&self) -> &'static str {
        match self {
            ParamName::D => "d",
            ParamName::De => "DE",
            ParamName::Dm => "DM",
            ParamName::Di => "DI",
            ParamName::Nt => "Nt",
            ParamName::Na => "Na",
            ParamName::P => "p",
            ParamName::Gap => "gap",
            ParamName::Lo => "Lo",
            ParamName::Ls => "Ls",
            ParamName::C => "C",
            ParamName::W => "w",
            ParamName::Fn => "fn",
            ParamName::K => "k",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ParamName::D => "Wire diameter",
            ParamName::De => "External diameter",
            ParamName::Dm => "Medium diameter",
            ParamName::Di => "Internal diameter",
            ParamName::Nt => "Total turns",
            ParamName::Na => "Active turns",
            ParamName::P => "Pitch",
            ParamName::Gap => "Coil gap",
            ParamName::Lo => "Free length",
            ParamName::Ls => "Solid length",
            ParamName::C => "Spring index",
            ParamName::W => "Mass",
            ParamName::Fn => "Natural frequency",
            ParamName::K => "Rate",
        }
    }

    /// Unit label (rate shown for compression/extension)
    pub fn unit(&self) -> &'static str {
        match self {
            ParamName::D
            | ParamName::De
            | ParamName::Dm
            | ParamName::Di
            | ParamName::P
            | ParamName::Gap
            | ParamName::Lo
            | ParamName::Ls => "mm",
            ParamName::Nt | ParamName::Na => "",
            ParamName::C => "mm/mm",
            ParamName::W => "kg",
            ParamName::Fn => "Hz",
            ParamName::K => "N/mm",
        }
    }

    /// Only the coil gap may legitimately be zero
    pub fn allows_zero(&self) -> bool {
        matches!(self, ParamName::Gap)
    }

    /// Check a value against the parameter's physical domain
    pub fn in_domain(&self, value: f64) -> bool {
        value.is_finite() && (value > 0.0 || (self.allows_zero() && value == 0.0))
    }

    /// Validate a user-supplied value.
    ///
    /// Values must be finite and strictly positive; `gap` may be zero.
    pub fn validate(&self, value: f64) -> SpringResult<f64> {
        let reject =
            |reason: &str| SpringError::invalid_value(self.symbol(), value.to_string(), reason);
        if !value.is_finite() {
            return Err(reject("must be a finite number"));
        }
        if self.allows_zero() {
            if value < 0.0 {
                return Err(reject("must not be negative"));
            }
        } else if value <= 0.0 {
            return Err(reject("must be greater than zero"));
        }
        Ok(value)
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ParamName {
    type Err = SpringError;

    /// Symbols are matched case-insensitively; they stay distinct when lowercased.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ParamName::ALL
            .iter()
            .copied()
            .find(|p| p.symbol().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let accepted: Vec<&str> = ParamName::ALL.iter().map(|p| p.symbol()).collect();
                SpringError::invalid_option("parameter", s, &accepted)
            })
    }
}

/// Resolution state of one parameter.
///
/// Serializes as `null` when unresolved and as a plain number otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ParamValue {
    /// Resolved numeric value
    Resolved(f64),
    /// Symbolic placeholder, no numeric value yet
    #[default]
    Unresolved,
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Resolved(v) => Some(*v),
            ParamValue::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ParamValue::Resolved(_))
    }
}

/// The mutable record of a spring's physical quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<ParamName, ParamValue>,
}

impl ParameterSet {
    /// Track the given fields, all unresolved
    pub fn new(fields: &[ParamName]) -> Self {
        ParameterSet {
            values: fields.iter().map(|p| (*p, ParamValue::Unresolved)).collect(),
        }
    }

    /// Track every parameter, all unresolved
    pub fn all_unresolved() -> Self {
        Self::new(&ParamName::ALL)
    }

    /// `None` when the field is absent from this set
    pub fn get(&self, name: ParamName) -> Option<ParamValue> {
        self.values.get(&name).copied()
    }

    /// Numeric value, if tracked and resolved
    pub fn value(&self, name: ParamName) -> Option<f64> {
        self.get(name).and_then(|v| v.as_f64())
    }

    /// Numeric value required by `operation`
    pub fn require(&self, name: ParamName, operation: &str) -> SpringResult<f64> {
        self.value(name)
            .ok_or_else(|| SpringError::missing_parameter(name.symbol(), operation))
    }

    /// Resolve a tracked field. Absent fields are left absent.
    pub fn set(&mut self, name: ParamName, value: f64) {
        if let Some(slot) = self.values.get_mut(&name) {
            *slot = ParamValue::Resolved(value);
        }
    }

    /// Return every tracked field to unresolved
    pub fn reset(&mut self) {
        for slot in self.values.values_mut() {
            *slot = ParamValue::Unresolved;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamName, ParamValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn unresolved(&self) -> BTreeSet<ParamName> {
        self.values
            .iter()
            .filter(|(_, v)| !v.is_resolved())
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.values.values().all(ParamValue::is_resolved)
    }

    /// Resolved values only
    pub fn resolved(&self) -> Bindings {
        self.values
            .iter()
            .filter_map(|(k, v)| v.as_f64().map(|x| (*k, x)))
            .collect()
    }

    /// Reject any resolved value outside its physical domain
    pub fn check_domain(&self) -> SpringResult<()> {
        for (name, value) in self.resolved() {
            if !name.in_domain(value) {
                let reason = if name.allows_zero() {
                    "must not be negative"
                } else {
                    "must be greater than zero"
                };
                return Err(SpringError::domain_violation(name.symbol(), value, reason));
            }
        }
        Ok(())
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::all_unresolved()
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            match value {
                ParamValue::Resolved(v) => writeln!(
                    f,
                    "  {:<4} {:>14.4} {:<6} {}",
                    name.symbol(),
                    v,
                    name.unit(),
                    name.display_name()
                )?,
                ParamValue::Unresolved => writeln!(
                    f,
                    "  {:<4} {:>14} {:<6} {}",
                    name.symbol(),
                    "(unresolved)",
                    name.unit(),
                    name.display_name()
                )?,
            }
        }
        Ok(())
    }
}

/// Parse `name=value` pairs (e.g. from a command line).
///
/// Non-numeric values are rejected with `InvalidValue`; names are kept as
/// given so unrecognized ones can be reported and ignored by the caller.
pub fn parse_known_pairs<S: AsRef<str>>(pairs: &[S]) -> SpringResult<BTreeMap<String, f64>> {
    let mut known = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (name, raw) = pair.split_once('=').ok_or_else(|| {
            SpringError::invalid_value(pair, pair, "expected NAME=VALUE")
        })?;
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| SpringError::invalid_value(name.trim(), raw.trim(), "not a number"))?;
        known.insert(name.trim().to_string(), value);
    }
    Ok(known)
}

/// Auxiliary hook/leg geometry, depending on the spring variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum HookGeometry {
    /// Compression springs carry no hooks
    #[default]
    None,
    /// Extension spring hooks
    Extension {
        /// Extra hook wire length beyond the two turns forming the hooks (mm)
        la_mm: f64,
        /// Bend radius at hook point A (mm); 0 means "use DM"
        ra_mm: f64,
        /// Bend radius at hook point B (mm); 0 means "use DM"
        rb_mm: f64,
    },
    /// Torsion spring legs
    Torsion {
        l1_mm: f64,
        l2_mm: f64,
    },
}

impl HookGeometry {
    /// Extension hooks with defaulted radii
    pub fn extension(la_mm: f64) -> Self {
        HookGeometry::Extension { la_mm, ra_mm: 0.0, rb_mm: 0.0 }
    }

    pub fn torsion(l1_mm: f64, l2_mm: f64) -> Self {
        HookGeometry::Torsion { l1_mm, l2_mm }
    }

    /// All lengths must be finite and non-negative
    pub fn validate(&self) -> SpringResult<()> {
        let fields: Vec<(&str, f64)> = match *self {
            HookGeometry::None => Vec::new(),
            HookGeometry::Extension { la_mm, ra_mm, rb_mm } => {
                vec![("La", la_mm), ("Ra", ra_mm), ("Rb", rb_mm)]
            }
            HookGeometry::Torsion { l1_mm, l2_mm } => vec![("L1", l1_mm), ("L2", l2_mm)],
        };
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(SpringError::invalid_value(
                    name,
                    value.to_string(),
                    "must be a non-negative length",
                ));
            }
        }
        Ok(())
    }

    /// Replace zero hook radii by the medium diameter
    pub fn with_default_radii(self, dm_mm: f64) -> Self {
        match self {
            HookGeometry::Extension { la_mm, ra_mm, rb_mm } => HookGeometry::Extension {
                la_mm,
                ra_mm: if ra_mm == 0.0 { dm_mm } else { ra_mm },
                rb_mm: if rb_mm == 0.0 { dm_mm } else { rb_mm },
            },
            other => other,
        }
    }
}
