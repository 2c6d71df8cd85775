//! Section, 2D and mass properties.

use serde::{Deserialize, Serialize};

use crate::axis::AxisMode2D;
use crate::entity::{EntityHeader, Ref};
use crate::material::MaterialCategory;

/// Cross-section shape. Dimensions are in model length units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionProfile {
    Rectangle {
        depth: f64,
        width: f64,
    },
    Circle {
        diameter: f64,
    },
    CircularHollow {
        diameter: f64,
        thickness: f64,
    },
    ISection {
        depth: f64,
        width: f64,
        web: f64,
        flange: f64,
    },
    Tee {
        depth: f64,
        width: f64,
        web: f64,
        flange: f64,
    },
    Channel {
        depth: f64,
        width: f64,
        web: f64,
        flange: f64,
    },
    Angle {
        depth: f64,
        width: f64,
        web: f64,
        flange: f64,
    },
    Taper {
        depth: f64,
        top_width: f64,
        bottom_width: f64,
    },
    Ellipse {
        depth: f64,
        width: f64,
    },
    /// Closed polygon of (y, z) points.
    Perimeter(Vec<[f64; 2]>),
}

/// 1D section property (`PROP_SEC`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property1D {
    pub header: EntityHeader,
    pub material_category: MaterialCategory,
    pub material: Ref,
    pub profile: SectionProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Property2DType {
    #[default]
    Shell,
    Plate,
    Stress,
    Membrane,
}

impl Property2DType {
    pub fn token(self) -> &'static str {
        match self {
            Property2DType::Shell => "SHELL",
            Property2DType::Plate => "PLATE",
            Property2DType::Stress => "STRESS",
            Property2DType::Membrane => "FABRIC",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "SHELL" => Some(Property2DType::Shell),
            "PLATE" => Some(Property2DType::Plate),
            "STRESS" => Some(Property2DType::Stress),
            "FABRIC" => Some(Property2DType::Membrane),
            _ => None,
        }
    }
}

/// 2D property (`PROP_2D`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property2D {
    pub header: EntityHeader,
    pub material_category: MaterialCategory,
    pub material: Ref,
    pub thickness: f64,
    /// How elements using this property derive their local axis.
    pub axis_mode: AxisMode2D,
    pub kind: Property2DType,
}

/// Lumped mass property (`PROP_MASS`) used by 0D elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMass {
    pub header: EntityHeader,
    pub mass: f64,
}
