use gwa_record::Handle;
use serde::{Deserialize, Serialize};

use crate::axis::{Axis, Vec3};
use crate::dof::{Restraint, Stiffness};
use crate::entity::EntityHeader;

/// Local axis of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum NodeAxis {
    #[default]
    Global,
    /// Reference to an `AXIS` record not yet resolved.
    Ref(Handle),
    /// Resolved triad.
    Explicit(Axis),
}

/// A point of the structural model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub header: EntityHeader,
    pub position: Vec3,
    pub axis: NodeAxis,
    pub restraint: Restraint,
    pub stiffness: Stiffness,
    /// Lumped point mass.
    pub mass: f64,
}

impl Node {
    pub fn new(handle: u32, x: f64, y: f64, z: f64) -> Self {
        Self::at(Vec3::new(x, y, z)).with_handle(Handle(handle))
    }

    /// Node implied by geometry, without handle or attributes.
    pub fn at(position: Vec3) -> Self {
        Self {
            header: EntityHeader::default(),
            position,
            axis: NodeAxis::Global,
            restraint: Restraint::default(),
            stiffness: Stiffness::default(),
            mass: 0.0,
        }
    }

    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.header.handle = handle;
        self
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.position.x, self.position.y, self.position.z]
    }

    pub fn distance_to(&self, position: &Vec3) -> f64 {
        (self.position - position).norm()
    }

    /// Folds a coincident node into this one: restraints are OR-ed,
    /// stiffnesses take the component-wise maximum, masses add up.
    ///
    /// Merging a node with itself (same handle or application id) leaves
    /// it unchanged.
    pub fn merge(&mut self, other: &Node) {
        self.restraint = self.restraint.union(other.restraint);
        self.stiffness = self.stiffness.max(other.stiffness);
        if !self.header.same_entity(&other.header) {
            self.mass += other.mass;
        }
        if matches!(self.axis, NodeAxis::Global) {
            self.axis = other.axis;
        }
        if self.header.name.is_empty() {
            self.header.name = other.header.name.clone();
        }
        if self.header.application_id.is_none() {
            self.header.application_id = other.header.application_id.clone();
        }
    }
}

/// A user coordinate system stored as an `AXIS` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisDefinition {
    pub header: EntityHeader,
    pub axis: Axis,
}
