use std::fmt::{Display, Formatter};

use gwa_record::{Color, Handle};
use serde::{Deserialize, Serialize};

use crate::material::MaterialCategory;

/// Fields shared by every entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityHeader {
    pub handle: Handle,
    pub name: String,
    pub color: Option<Color>,
    /// Identifier of the entity in the application on the other side.
    pub application_id: Option<String>,
}

impl EntityHeader {
    pub fn new(handle: u32, name: impl Into<String>) -> Self {
        Self {
            handle: Handle(handle),
            name: name.into(),
            color: None,
            application_id: None,
        }
    }

    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    /// True when both headers identify the same entity: equal assigned
    /// handles or equal application ids.
    pub fn same_entity(&self, other: &EntityHeader) -> bool {
        let same_handle = self.handle.is_set() && self.handle == other.handle;
        let same_app = matches!(
            (&self.application_id, &other.application_id),
            (Some(a), Some(b)) if a == b
        );
        same_handle || same_app
    }
}

/// A reference to another entity.
///
/// Read always produces handles; on write a reference may instead name the
/// target by application id, resolved once the target has been allocated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ref {
    Handle(Handle),
    AppId(String),
}

impl Ref {
    pub fn handle(&self) -> Option<Handle> {
        match self {
            Ref::Handle(handle) if handle.is_set() => Some(*handle),
            _ => None,
        }
    }
}

impl Default for Ref {
    fn default() -> Self {
        Ref::Handle(Handle::UNSET)
    }
}

impl From<u32> for Ref {
    fn from(value: u32) -> Self {
        Ref::Handle(Handle(value))
    }
}

impl From<Handle> for Ref {
    fn from(value: Handle) -> Self {
        Ref::Handle(value)
    }
}

/// The fixed set of entity kinds exchanged over the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Material,
    Property1D,
    Property2D,
    PropertyMass,
    Axis,
    Node,
    Element0D,
    Element1D,
    Element2D,
    Mesh,
    Member1D,
    Member2D,
    LoadCase,
    LoadNode,
    Load1D,
    Load2D,
}

impl EntityKind {
    pub const ALL: [EntityKind; 16] = [
        EntityKind::Material,
        EntityKind::Property1D,
        EntityKind::Property2D,
        EntityKind::PropertyMass,
        EntityKind::Axis,
        EntityKind::Node,
        EntityKind::Element0D,
        EntityKind::Element1D,
        EntityKind::Element2D,
        EntityKind::Mesh,
        EntityKind::Member1D,
        EntityKind::Member2D,
        EntityKind::LoadCase,
        EntityKind::LoadNode,
        EntityKind::Load1D,
        EntityKind::Load2D,
    ];

    /// Kinds sharing a keyword share one handle space. Materials have none
    /// of their own: each category is numbered separately, see
    /// `Material::handle_space`.
    pub fn handle_space(self) -> Option<HandleSpace> {
        let space = match self {
            EntityKind::Material => return None,
            EntityKind::Property1D => HandleSpace::Property1D,
            EntityKind::Property2D => HandleSpace::Property2D,
            EntityKind::PropertyMass => HandleSpace::PropertyMass,
            EntityKind::Axis => HandleSpace::Axis,
            EntityKind::Node => HandleSpace::Node,
            EntityKind::Element0D
            | EntityKind::Element1D
            | EntityKind::Element2D
            | EntityKind::Mesh => HandleSpace::Element,
            EntityKind::Member1D | EntityKind::Member2D => HandleSpace::Member,
            EntityKind::LoadCase => HandleSpace::LoadCase,
            EntityKind::LoadNode => HandleSpace::LoadNode,
            EntityKind::Load1D => HandleSpace::Load1D,
            EntityKind::Load2D => HandleSpace::Load2D,
        };
        Some(space)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Independent numbering domain on the protocol side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandleSpace {
    Material(MaterialCategory),
    Property1D,
    Property2D,
    PropertyMass,
    Axis,
    Node,
    Element,
    Member,
    LoadCase,
    LoadNode,
    Load1D,
    Load2D,
}

impl Display for HandleSpace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleSpace::Material(category) => write!(f, "{category:?} material"),
            space => write!(f, "{space:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_kinds_share_one_handle_space() {
        assert_eq!(EntityKind::Element0D.handle_space(), Some(HandleSpace::Element));
        assert_eq!(EntityKind::Mesh.handle_space(), Some(HandleSpace::Element));
        assert_ne!(EntityKind::Node.handle_space(), Some(HandleSpace::Element));
        assert_eq!(EntityKind::Material.handle_space(), None);
    }

    #[test]
    fn same_entity_needs_assigned_handles() {
        let a = EntityHeader::new(0, "a");
        let b = EntityHeader::new(0, "b");
        assert!(!a.same_entity(&b));
        let a = a.with_application_id("n1");
        let b = b.with_application_id("n1");
        assert!(a.same_entity(&b));
        assert!(EntityHeader::new(4, "x").same_entity(&EntityHeader::new(4, "y")));
    }
}
