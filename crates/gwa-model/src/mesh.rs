//! Groups of edge-connected 2D elements with a shared vertex table.

use std::collections::HashMap;

use gwa_record::Handle;
use serde::{Deserialize, Serialize};

use crate::axis::Vec3;
use crate::element::{Element2D, ElementCategory};
use crate::entity::{EntityHeader, Ref};

/// One face of a mesh; its header carries the element handle it expands to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshFace {
    pub header: EntityHeader,
    /// Indices into [`Mesh::vertices`], in corner order.
    pub vertices: Vec<usize>,
    pub rotation: f64,
}

/// Undirected edge between two vertex indices (`a < b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshEdge {
    pub a: usize,
    pub b: usize,
    /// Number of faces using this edge.
    pub faces: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub header: EntityHeader,
    pub property: Ref,
    pub offset: f64,
    pub group: u32,
    /// Deduplicated vertex positions.
    pub vertices: Vec<Vec3>,
    /// Node handle per vertex, unset when the vertex came from geometry only.
    pub vertex_nodes: Vec<Handle>,
    pub faces: Vec<MeshFace>,
    pub edges: Vec<MeshEdge>,
}

impl Mesh {
    pub fn new(handle: u32, property: Ref, offset: f64) -> Self {
        Self {
            header: EntityHeader::new(handle, ""),
            property,
            offset,
            ..Default::default()
        }
    }

    /// Returns the index of the vertex, adding it when unseen.
    ///
    /// Vertices with a node handle match on the handle, others on the exact
    /// position.
    pub fn vertex_index(&mut self, position: Vec3, node: Handle) -> usize {
        let existing = self
            .vertices
            .iter()
            .zip(&self.vertex_nodes)
            .position(|(p, n)| {
                if node.is_set() {
                    *n == node
                } else {
                    !n.is_set() && *p == position
                }
            });
        match existing {
            Some(index) => index,
            None => {
                self.vertices.push(position);
                self.vertex_nodes.push(node);
                self.vertices.len() - 1
            }
        }
    }

    /// Adds a face from its corner positions and, when known, node handles.
    /// Call [`Mesh::rebuild_edges`] once all faces are in.
    pub fn add_face(
        &mut self,
        header: EntityHeader,
        corners: &[Vec3],
        nodes: &[Handle],
        rotation: f64,
    ) -> usize {
        let vertices = corners
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let node = nodes.get(i).copied().unwrap_or(Handle::UNSET);
                self.vertex_index(*p, node)
            })
            .collect();
        self.faces.push(MeshFace {
            header,
            vertices,
            rotation,
        });
        self.faces.len() - 1
    }

    /// Recomputes the undirected edge list with use counts, in order of
    /// first appearance.
    pub fn rebuild_edges(&mut self) {
        let mut edges: Vec<MeshEdge> = Vec::new();
        let mut seen = HashMap::<(usize, usize), usize>::new();
        for face in &self.faces {
            let n = face.vertices.len();
            for i in 0..n {
                let (u, v) = (face.vertices[i], face.vertices[(i + 1) % n]);
                let (a, b) = if u <= v { (u, v) } else { (v, u) };
                match seen.get(&(a, b)) {
                    Some(slot) => edges[*slot].faces += 1,
                    None => {
                        seen.insert((a, b), edges.len());
                        edges.push(MeshEdge { a, b, faces: 1 });
                    }
                }
            }
        }
        self.edges = edges;
    }

    /// Edges used by exactly one face.
    pub fn boundary_edges(&self) -> Vec<MeshEdge> {
        self.edges.iter().copied().filter(|e| e.faces == 1).collect()
    }

    pub fn face_corners(&self, face: &MeshFace) -> Vec<Vec3> {
        face.vertices.iter().map(|i| self.vertices[*i]).collect()
    }

    /// Re-expands the mesh into discrete 2D elements.
    ///
    /// Connectivity is filled only when every corner has a node handle;
    /// otherwise the elements carry coordinates alone.
    pub fn expand(&self) -> Vec<Element2D> {
        self.faces
            .iter()
            .map(|face| {
                let nodes: Vec<Handle> = face.vertices.iter().map(|i| self.vertex_nodes[*i]).collect();
                let connectivity = if nodes.iter().all(|n| n.is_set()) {
                    nodes
                } else {
                    Vec::new()
                };
                let mut header = face.header.clone();
                if header.color.is_none() {
                    header.color = self.header.color;
                }
                Element2D {
                    header,
                    category: ElementCategory::for_face(face.vertices.len())
                        .unwrap_or(ElementCategory::Quad4),
                    property: self.property.clone(),
                    group: self.group,
                    connectivity,
                    coordinates: self.face_corners(face),
                    rotation: face.rotation,
                    offset: self.offset,
                    local_axis: None,
                }
            })
            .collect()
    }

    /// Element handles of the faces.
    pub fn element_handles(&self) -> Vec<Handle> {
        self.faces.iter().map(|f| f.header.handle).collect()
    }
}
