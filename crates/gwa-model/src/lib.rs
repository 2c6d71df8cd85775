//! Structural model exchanged over the GWA protocol.
//!
//! Entities are grouped per kind in a [`Model`], which lives for one read or
//! write operation. Geometry helpers for local axes live in [`axis`].

pub mod axis;
mod dof;
mod element;
mod entity;
mod load;
mod material;
mod member;
mod mesh;
mod model;
mod node;
mod property;

pub use axis::{Axis, AxisMode2D, Vec3};
pub use dof::{Dof6, Restraint, Stiffness};
pub use element::{Element0D, Element1D, Element2D, ElementCategory, EndRelease, Release};
pub use entity::{EntityHeader, EntityKind, HandleSpace, Ref};
pub use gwa_record::{Color, Handle};
pub use load::{BeamLoad, FaceLoad, LoadAxis, LoadCase, LoadCaseType, NodeLoad};
pub use material::{Material, MaterialCategory};
pub use member::{Member1D, Member2D, MemberCategory};
pub use mesh::{Mesh, MeshEdge, MeshFace};
pub use model::{Model, ModelSummary};
pub use node::{AxisDefinition, Node, NodeAxis};
pub use property::{Property1D, Property2D, Property2DType, PropertyMass, SectionProfile};
