//! Design-layer members. They mirror 1D/2D elements but are keyed in their
//! own handle space and carry their topology as a node list.

use gwa_record::Handle;
use serde::{Deserialize, Serialize};

use crate::axis::Vec3;
use crate::entity::{EntityHeader, Ref};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberCategory {
    Beam,
    Column,
    Generic1D,
    Slab,
    Wall,
    Generic2D,
}

impl MemberCategory {
    pub fn is_2d(self) -> bool {
        matches!(
            self,
            MemberCategory::Slab | MemberCategory::Wall | MemberCategory::Generic2D
        )
    }

    pub fn token(self) -> &'static str {
        match self {
            MemberCategory::Beam => "BEAM",
            MemberCategory::Column => "COLUMN",
            MemberCategory::Generic1D => "GENERIC_1D",
            MemberCategory::Slab => "SLAB",
            MemberCategory::Wall => "WALL",
            MemberCategory::Generic2D => "GENERIC_2D",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "BEAM" => Some(MemberCategory::Beam),
            "COLUMN" => Some(MemberCategory::Column),
            "GENERIC_1D" => Some(MemberCategory::Generic1D),
            "SLAB" => Some(MemberCategory::Slab),
            "WALL" => Some(MemberCategory::Wall),
            "GENERIC_2D" => Some(MemberCategory::Generic2D),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member1D {
    pub header: EntityHeader,
    pub category: MemberCategory,
    pub property: Ref,
    pub group: u32,
    pub topology: Vec<Handle>,
    pub coordinates: Vec<Vec3>,
    pub orientation_node: Handle,
    /// Rotation about local x in degrees.
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member2D {
    pub header: EntityHeader,
    pub category: MemberCategory,
    pub property: Ref,
    pub group: u32,
    /// Perimeter nodes in order.
    pub topology: Vec<Handle>,
    pub coordinates: Vec<Vec3>,
    /// Rotation about local z in degrees.
    pub rotation: f64,
    pub offset: f64,
}

impl Member1D {
    pub fn new(handle: u32, category: MemberCategory, property: Ref, topology: &[u32]) -> Self {
        Self {
            header: EntityHeader::new(handle, ""),
            category,
            property,
            group: 0,
            topology: topology.iter().map(|h| Handle(*h)).collect(),
            coordinates: Vec::new(),
            orientation_node: Handle::UNSET,
            rotation: 0.0,
        }
    }
}

impl Member2D {
    pub fn new(handle: u32, category: MemberCategory, property: Ref, topology: &[u32]) -> Self {
        Self {
            header: EntityHeader::new(handle, ""),
            category,
            property,
            group: 0,
            topology: topology.iter().map(|h| Handle(*h)).collect(),
            coordinates: Vec::new(),
            rotation: 0.0,
            offset: 0.0,
        }
    }
}
