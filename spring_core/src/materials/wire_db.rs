//! TOML-backed wire material table.
//!
//! ```toml
//! [[material]]
//! id = "A227"
//! name = "Hard-drawn carbon steel (ASTM A227)"
//! density_kg_mm3 = 7.85e-6
//! shear_modulus_mpa = 80700.0
//! elastic_modulus_mpa = 197900.0
//! max_service_temp_c = 120.0
//! heat_treat_temp_c = 230.0
//! heat_treat_time_min = 30.0
//! fatigue_group = "carbon"
//!
//! [[material.strength]]
//! min_gauge_mm = 0.5
//! max_gauge_mm = 16.0
//! a_mpa = 1783.0
//! m = 0.190
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::{FatigueGroup, MaterialProperties, MaterialProvider, StrengthCoefficients};
use crate::errors::{SpringError, SpringResult};

const BUILTIN_WIRES: &str = include_str!("wires.toml");

/// One tensile-strength row, valid for `min_gauge_mm <= d <= max_gauge_mm`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct StrengthRange {
    min_gauge_mm: f64,
    max_gauge_mm: f64,
    a_mpa: f64,
    m: f64,
}

impl StrengthRange {
    fn brackets(&self, gauge_mm: f64) -> bool {
        gauge_mm >= self.min_gauge_mm && gauge_mm <= self.max_gauge_mm
    }
}

#[derive(Debug, Clone, Deserialize)]
struct MaterialRecord {
    id: String,
    name: String,
    density_kg_mm3: f64,
    shear_modulus_mpa: f64,
    elastic_modulus_mpa: f64,
    max_service_temp_c: f64,
    heat_treat_temp_c: f64,
    heat_treat_time_min: f64,
    fatigue_group: FatigueGroup,
    #[serde(default)]
    strength: Vec<StrengthRange>,
}

impl MaterialRecord {
    fn properties(&self) -> MaterialProperties {
        MaterialProperties {
            id: self.id.clone(),
            name: self.name.clone(),
            density_kg_mm3: self.density_kg_mm3,
            shear_modulus_mpa: self.shear_modulus_mpa,
            elastic_modulus_mpa: self.elastic_modulus_mpa,
            max_service_temp_c: self.max_service_temp_c,
            heat_treat_temp_c: self.heat_treat_temp_c,
            heat_treat_time_min: self.heat_treat_time_min,
            fatigue_group: self.fatigue_group,
        }
    }

    fn validate(&self) -> SpringResult<()> {
        let moduli = [
            ("density_kg_mm3", self.density_kg_mm3),
            ("shear_modulus_mpa", self.shear_modulus_mpa),
            ("elastic_modulus_mpa", self.elastic_modulus_mpa),
        ];
        for (field, value) in moduli {
            if !(value.is_finite() && value > 0.0) {
                return Err(SpringError::invalid_value(
                    format!("{}.{}", self.id, field),
                    value.to_string(),
                    "must be greater than zero",
                ));
            }
        }
        for row in &self.strength {
            if !(row.min_gauge_mm > 0.0 && row.min_gauge_mm < row.max_gauge_mm && row.a_mpa > 0.0) {
                return Err(SpringError::invalid_value(
                    format!("{}.strength", self.id),
                    format!("[{}, {}]", row.min_gauge_mm, row.max_gauge_mm),
                    "gauge range must be positive and ordered with A > 0",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MaterialTable {
    #[serde(default)]
    material: Vec<MaterialRecord>,
}

/// Wire materials indexed by uppercase identifier
#[derive(Debug, Clone, Default)]
pub struct MaterialDb {
    materials: BTreeMap<String, MaterialRecord>,
}

impl MaterialDb {
    /// The table shipped with the crate (A227, A228, A229, A231, A401, T302)
    pub fn builtin() -> SpringResult<Self> {
        Self::from_toml_str(BUILTIN_WIRES)
    }

    /// Parse a material table from TOML text
    pub fn from_toml_str(text: &str) -> SpringResult<Self> {
        let table: MaterialTable =
            toml::from_str(text).map_err(|e| SpringError::SerializationError {
                reason: format!("Invalid material table: {}", e),
            })?;

        let mut materials = BTreeMap::new();
        for record in table.material {
            record.validate()?;
            let key = record.id.trim().to_uppercase();
            if materials.contains_key(&key) {
                return Err(SpringError::invalid_value(
                    "material",
                    record.id.clone(),
                    "duplicate identifier",
                ));
            }
            materials.insert(key, record);
        }
        debug!(count = materials.len(), "loaded material table");
        Ok(MaterialDb { materials })
    }

    /// Load a material table from a TOML file
    pub fn load(path: impl AsRef<Path>) -> SpringResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SpringError::file_error("read", path.display().to_string(), e.to_string())
        })?;
        Self::from_toml_str(&text)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    fn record(&self, id: &str) -> SpringResult<&MaterialRecord> {
        self.materials
            .get(&id.trim().to_uppercase())
            .ok_or_else(|| SpringError::material_not_found(id))
    }
}

impl MaterialProvider for MaterialDb {
    fn lookup(&self, id: &str) -> SpringResult<MaterialProperties> {
        self.record(id).map(MaterialRecord::properties)
    }

    fn strength_coefficients(&self, id: &str, gauge_mm: f64) -> SpringResult<StrengthCoefficients> {
        let record = self.record(id)?;
        record
            .strength
            .iter()
            .find(|row| row.brackets(gauge_mm))
            .map(|row| StrengthCoefficients { a_mpa: row.a_mpa, m: row.m })
            .ok_or_else(|| SpringError::OutOfRange {
                material: record.id.clone(),
                gauge_mm,
            })
    }

    fn list_materials(&self) -> BTreeSet<String> {
        self.materials.values().map(|r| r.id.clone()).collect()
    }
}
