//! Load cases and the loads applied under them.

use serde::{Deserialize, Serialize};

use crate::axis::Vec3;
use crate::dof::Dof6;
use crate::entity::{EntityHeader, Ref};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadCaseType {
    Dead,
    Live,
    Wind,
    Snow,
    Seismic,
    #[default]
    Generic,
}

impl LoadCaseType {
    pub fn token(self) -> &'static str {
        match self {
            LoadCaseType::Dead => "DEAD",
            LoadCaseType::Live => "LIVE",
            LoadCaseType::Wind => "WIND",
            LoadCaseType::Snow => "SNOW",
            LoadCaseType::Seismic => "SEISMIC",
            LoadCaseType::Generic => "UNDEF",
        }
    }

    /// Unrecognised types read as `Generic`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "DEAD" => LoadCaseType::Dead,
            "LIVE" => LoadCaseType::Live,
            "WIND" => LoadCaseType::Wind,
            "SNOW" => LoadCaseType::Snow,
            "SEISMIC" => LoadCaseType::Seismic,
            _ => LoadCaseType::Generic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCase {
    pub header: EntityHeader,
    pub case_type: LoadCaseType,
}

impl LoadCase {
    pub fn new(handle: u32, name: impl Into<String>, case_type: LoadCaseType) -> Self {
        Self {
            header: EntityHeader::new(handle, name),
            case_type,
        }
    }
}

/// Frame a load vector is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadAxis {
    #[default]
    Global,
    Local,
}

impl LoadAxis {
    pub fn token(self) -> &'static str {
        match self {
            LoadAxis::Global => "GLOBAL",
            LoadAxis::Local => "LOCAL",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "GLOBAL" => Some(LoadAxis::Global),
            "LOCAL" => Some(LoadAxis::Local),
            _ => None,
        }
    }
}

/// Point forces and moments on nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLoad {
    pub header: EntityHeader,
    pub targets: Vec<Ref>,
    pub case: Ref,
    pub axis: LoadAxis,
    pub vector: Dof6<f64>,
}

/// Uniformly distributed load along 1D elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamLoad {
    pub header: EntityHeader,
    pub targets: Vec<Ref>,
    pub case: Ref,
    pub axis: LoadAxis,
    pub vector: Dof6<f64>,
}

/// Uniform pressure on 2D elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceLoad {
    pub header: EntityHeader,
    pub targets: Vec<Ref>,
    pub case: Ref,
    pub axis: LoadAxis,
    /// Pressure acts on the projected area.
    pub projected: bool,
    pub pressure: Vec3,
}
