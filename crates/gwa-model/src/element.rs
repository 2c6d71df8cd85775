//! Analysis elements: 0D masses, 1D bars/beams and 2D shells.

use gwa_record::Handle;
use serde::{Deserialize, Serialize};

use crate::axis::{Axis, Vec3};
use crate::dof::Dof6;
use crate::entity::{EntityHeader, Ref};

/// Element type as written in the `EL` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementCategory {
    Mass,
    Beam,
    Bar,
    Rod,
    Strut,
    Tie,
    Tri3,
    Quad4,
}

impl ElementCategory {
    pub fn num_nodes(self) -> usize {
        match self {
            ElementCategory::Mass => 1,
            ElementCategory::Beam
            | ElementCategory::Bar
            | ElementCategory::Rod
            | ElementCategory::Strut
            | ElementCategory::Tie => 2,
            ElementCategory::Tri3 => 3,
            ElementCategory::Quad4 => 4,
        }
    }

    pub fn dimension(self) -> u8 {
        match self.num_nodes() {
            1 => 0,
            2 => 1,
            _ => 2,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            ElementCategory::Mass => "MASS",
            ElementCategory::Beam => "BEAM",
            ElementCategory::Bar => "BAR",
            ElementCategory::Rod => "ROD",
            ElementCategory::Strut => "STRUT",
            ElementCategory::Tie => "TIE",
            ElementCategory::Tri3 => "TRI3",
            ElementCategory::Quad4 => "QUAD4",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "MASS" => Some(ElementCategory::Mass),
            "BEAM" => Some(ElementCategory::Beam),
            "BAR" => Some(ElementCategory::Bar),
            "ROD" => Some(ElementCategory::Rod),
            "STRUT" => Some(ElementCategory::Strut),
            "TIE" => Some(ElementCategory::Tie),
            "TRI3" => Some(ElementCategory::Tri3),
            "QUAD4" => Some(ElementCategory::Quad4),
            _ => None,
        }
    }

    /// 2D category for a face with the given corner count.
    pub fn for_face(corners: usize) -> Option<Self> {
        match corners {
            3 => Some(ElementCategory::Tri3),
            4 => Some(ElementCategory::Quad4),
            _ => None,
        }
    }
}

/// End condition of one degree of freedom at a 1D element end.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Release {
    #[default]
    Fixed,
    Released,
    /// Partial fixity with the given spring stiffness.
    Stiffness(f64),
}

pub type EndRelease = Dof6<Release>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element0D {
    pub header: EntityHeader,
    /// Mass property.
    pub property: Ref,
    pub group: u32,
    pub connectivity: Vec<Handle>,
    pub coordinates: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element1D {
    pub header: EntityHeader,
    pub category: ElementCategory,
    /// Section property.
    pub property: Ref,
    pub group: u32,
    pub connectivity: Vec<Handle>,
    pub coordinates: Vec<Vec3>,
    /// Orientation node handle, as read.
    pub orientation_node: Handle,
    /// Orientation point, resolved to a node on write.
    pub orientation_point: Option<Vec3>,
    /// Rotation about local x in degrees.
    pub rotation: f64,
    /// Releases at start and end; `None` when both ends are fixed.
    pub releases: Option<[EndRelease; 2]>,
    pub local_axis: Option<Axis>,
}

impl Element1D {
    pub fn new(handle: u32, category: ElementCategory, property: Ref, nodes: [u32; 2]) -> Self {
        Self {
            header: EntityHeader::new(handle, ""),
            category,
            property,
            group: 0,
            connectivity: nodes.iter().map(|n| Handle(*n)).collect(),
            coordinates: Vec::new(),
            orientation_node: Handle::UNSET,
            orientation_point: None,
            rotation: 0.0,
            releases: None,
            local_axis: None,
        }
    }

    /// Design-side element defined by its end coordinates.
    pub fn between(start: Vec3, end: Vec3, property: Ref) -> Self {
        Self {
            coordinates: vec![start, end],
            connectivity: Vec::new(),
            ..Self::new(0, ElementCategory::Beam, property, [0, 0])
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element2D {
    pub header: EntityHeader,
    pub category: ElementCategory,
    /// 2D property.
    pub property: Ref,
    pub group: u32,
    pub connectivity: Vec<Handle>,
    pub coordinates: Vec<Vec3>,
    /// Rotation about local z in degrees.
    pub rotation: f64,
    /// Offset of the reference surface along local z.
    pub offset: f64,
    pub local_axis: Option<Axis>,
}

impl Element2D {
    pub fn new(handle: u32, property: Ref, nodes: &[u32]) -> Self {
        Self {
            header: EntityHeader::new(handle, ""),
            category: ElementCategory::for_face(nodes.len()).unwrap_or(ElementCategory::Quad4),
            property,
            group: 0,
            connectivity: nodes.iter().map(|n| Handle(*n)).collect(),
            coordinates: Vec::new(),
            rotation: 0.0,
            offset: 0.0,
            local_axis: None,
        }
    }

    /// Design-side face defined by its corner coordinates.
    pub fn from_corners(corners: Vec<Vec3>, property: Ref) -> Self {
        Self {
            category: ElementCategory::for_face(corners.len()).unwrap_or(ElementCategory::Quad4),
            coordinates: corners,
            connectivity: Vec::new(),
            ..Self::new(0, property, &[])
        }
    }

    /// Undirected edges in corner order, each as (low, high) handle pair.
    pub fn edges(&self) -> Vec<(Handle, Handle)> {
        let n = self.connectivity.len();
        (0..n)
            .map(|i| {
                let a = self.connectivity[i];
                let b = self.connectivity[(i + 1) % n];
                if a <= b { (a, b) } else { (b, a) }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_know_their_node_counts() {
        assert_eq!(ElementCategory::Mass.num_nodes(), 1);
        assert_eq!(ElementCategory::Tie.dimension(), 1);
        assert_eq!(ElementCategory::Tri3.dimension(), 2);
        assert_eq!(ElementCategory::from_token("quad4"), Some(ElementCategory::Quad4));
        assert_eq!(ElementCategory::from_token("C3D8"), None);
    }

    #[test]
    fn face_edges_are_undirected() {
        let quad = Element2D::new(1, Ref::from(1), &[4, 2, 9, 7]);
        let edges = quad.edges();
        assert_eq!(edges[0], (Handle(2), Handle(4)));
        assert_eq!(edges[3], (Handle(4), Handle(7)));
    }
}
