//! Material definitions.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityHeader, HandleSpace};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum MaterialCategory {
    Steel,
    Concrete,
    #[default]
    Generic,
}

impl MaterialCategory {
    /// Token used where a property names the material type.
    pub fn token(self) -> &'static str {
        match self {
            MaterialCategory::Steel => "STEEL",
            MaterialCategory::Concrete => "CONCRETE",
            MaterialCategory::Generic => "GENERIC",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "STEEL" => Some(MaterialCategory::Steel),
            "CONCRETE" => Some(MaterialCategory::Concrete),
            "GENERIC" => Some(MaterialCategory::Generic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub header: EntityHeader,
    pub category: MaterialCategory,
    pub grade: String,
    /// Young's modulus (E)
    pub elastic_modulus: f64,
    /// Poisson's ratio (ν)
    pub poissons_ratio: f64,
    /// Density (ρ)
    pub density: f64,
    /// Thermal expansion coefficient
    pub thermal_expansion: f64,
}

impl Material {
    pub fn new(handle: u32, category: MaterialCategory, grade: impl Into<String>) -> Self {
        let grade = grade.into();
        Self {
            header: EntityHeader::new(handle, grade.clone()),
            category,
            grade,
            elastic_modulus: 0.0,
            poissons_ratio: 0.0,
            density: 0.0,
            thermal_expansion: 0.0,
        }
    }

    /// Materials are numbered separately per category.
    pub fn handle_space(&self) -> HandleSpace {
        HandleSpace::Material(self.category)
    }

    /// Shear modulus G = E / 2(1 + ν).
    pub fn shear_modulus(&self) -> f64 {
        self.elastic_modulus / (2.0 * (1.0 + self.poissons_ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shear_modulus_from_e_and_nu() {
        let mut steel = Material::new(1, MaterialCategory::Steel, "S355");
        steel.elastic_modulus = 200e9;
        steel.poissons_ratio = 0.3;
        assert!((steel.shear_modulus() - 76.923e9).abs() < 1e6);
    }

    #[test]
    fn categories_number_independently() {
        let steel = Material::new(1, MaterialCategory::Steel, "S355");
        let concrete = Material::new(1, MaterialCategory::Concrete, "C30");
        assert_ne!(steel.handle_space(), concrete.handle_space());
    }
}
