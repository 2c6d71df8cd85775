use std::collections::{BTreeMap, BTreeSet};

use gwa_record::Handle;
use serde::{Deserialize, Serialize};

use crate::element::{Element0D, Element1D, Element2D};
use crate::entity::{EntityHeader, EntityKind, HandleSpace};
use crate::load::{BeamLoad, FaceLoad, LoadCase, NodeLoad};
use crate::material::Material;
use crate::member::{Member1D, Member2D};
use crate::mesh::Mesh;
use crate::node::{AxisDefinition, Node};
use crate::property::{Property1D, Property2D, PropertyMass};

/// Per-kind entity collections for one read or write operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub materials: Vec<Material>,
    pub sections: Vec<Property1D>,
    pub properties_2d: Vec<Property2D>,
    pub mass_properties: Vec<PropertyMass>,
    pub axes: Vec<AxisDefinition>,
    pub nodes: Vec<Node>,
    pub elements_0d: Vec<Element0D>,
    pub elements_1d: Vec<Element1D>,
    pub elements_2d: Vec<Element2D>,
    pub meshes: Vec<Mesh>,
    pub members_1d: Vec<Member1D>,
    pub members_2d: Vec<Member2D>,
    pub load_cases: Vec<LoadCase>,
    pub node_loads: Vec<NodeLoad>,
    pub beam_loads: Vec<BeamLoad>,
    pub face_loads: Vec<FaceLoad>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers of every entity of `kind`, in collection order.
    pub fn headers(&self, kind: EntityKind) -> Vec<&EntityHeader> {
        fn h<T>(items: &[T], f: impl Fn(&T) -> &EntityHeader) -> Vec<&EntityHeader> {
            items.iter().map(f).collect()
        }
        match kind {
            EntityKind::Material => h(&self.materials, |e| &e.header),
            EntityKind::Property1D => h(&self.sections, |e| &e.header),
            EntityKind::Property2D => h(&self.properties_2d, |e| &e.header),
            EntityKind::PropertyMass => h(&self.mass_properties, |e| &e.header),
            EntityKind::Axis => h(&self.axes, |e| &e.header),
            EntityKind::Node => h(&self.nodes, |e| &e.header),
            EntityKind::Element0D => h(&self.elements_0d, |e| &e.header),
            EntityKind::Element1D => h(&self.elements_1d, |e| &e.header),
            EntityKind::Element2D => h(&self.elements_2d, |e| &e.header),
            EntityKind::Mesh => h(&self.meshes, |e| &e.header),
            EntityKind::Member1D => h(&self.members_1d, |e| &e.header),
            EntityKind::Member2D => h(&self.members_2d, |e| &e.header),
            EntityKind::LoadCase => h(&self.load_cases, |e| &e.header),
            EntityKind::LoadNode => h(&self.node_loads, |e| &e.header),
            EntityKind::Load1D => h(&self.beam_loads, |e| &e.header),
            EntityKind::Load2D => h(&self.face_loads, |e| &e.header),
        }
    }

    /// Headers of `kind` paired with the handle space each is numbered in.
    pub fn spaced_headers(&self, kind: EntityKind) -> Vec<(HandleSpace, &EntityHeader)> {
        match kind.handle_space() {
            Some(space) => self.headers(kind).into_iter().map(|h| (space, h)).collect(),
            None => self
                .materials
                .iter()
                .map(|m| (m.handle_space(), &m.header))
                .collect(),
        }
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.headers(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }

    /// Assigned handles of `kind`, as offered to a results consumer.
    ///
    /// Meshes report the element handles of their faces, since results are
    /// keyed by element.
    pub fn handles(&self, kind: EntityKind) -> BTreeSet<Handle> {
        let handles: Vec<Handle> = match kind {
            EntityKind::Mesh => self.meshes.iter().flat_map(|m| m.element_handles()).collect(),
            _ => self.headers(kind).iter().map(|h| h.handle).collect(),
        };
        handles.into_iter().filter(|h| h.is_set()).collect()
    }

    pub fn node(&self, handle: Handle) -> Option<&Node> {
        self.nodes.iter().find(|n| n.header.handle == handle)
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary::from_model(self)
    }
}

/// Entity counts of a model, keyed by kind name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub total_entities: usize,
    pub kind_counts: BTreeMap<String, usize>,
    pub mesh_faces: usize,
    pub restrained_nodes: usize,
    pub has_loads: bool,
}

impl ModelSummary {
    pub fn from_model(model: &Model) -> Self {
        let mut kind_counts = BTreeMap::<String, usize>::new();
        let mut total_entities = 0usize;
        for kind in EntityKind::ALL {
            let count = model.len(kind);
            if count > 0 {
                kind_counts.insert(kind.to_string(), count);
                total_entities += count;
            }
        }

        let mesh_faces = model.meshes.iter().map(|m| m.faces.len()).sum();
        let restrained_nodes = model.nodes.iter().filter(|n| n.restraint.any()).count();
        let has_loads = !(model.node_loads.is_empty()
            && model.beam_loads.is_empty()
            && model.face_loads.is_empty());

        Self {
            total_entities,
            kind_counts,
            mesh_faces,
            restrained_nodes,
            has_loads,
        }
    }
}
