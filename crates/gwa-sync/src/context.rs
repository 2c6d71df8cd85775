//! Working state of one read or write operation.

use std::collections::{BTreeMap, HashMap};

use gwa_model::{
    AxisMode2D, EntityKind, Handle, HandleSpace, Model, Node, Ref, Vec3,
};
use gwa_record::{GwaRecord, RecordError, STREAM_ID_TAG, parse_handle_list};

use crate::allocator::{HandleAllocator, Seed};
use crate::config::SyncConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::merge::NodeIndex;

/// State shared by the converters of a read pass.
#[derive(Debug)]
pub struct ReadContext<'a> {
    pub config: &'a SyncConfig,
    pub model: Model,
    pub diagnostics: Diagnostics,
    lists: HashMap<String, Vec<Handle>>,
    node_positions: HashMap<Handle, Vec3>,
}

impl<'a> ReadContext<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self {
            config,
            model: Model::new(),
            diagnostics: Diagnostics::new(),
            lists: HashMap::new(),
            node_positions: HashMap::new(),
        }
    }

    /// Makes a named list available to handle-list fields.
    pub fn define_list(&mut self, name: impl Into<String>, handles: Vec<Handle>) {
        self.lists.insert(name.into(), handles);
    }

    pub fn parse_targets(&self, text: &str) -> std::result::Result<Vec<Handle>, RecordError> {
        parse_handle_list(text, |name| self.lists.get(name).cloned())
    }

    /// Rebuilds the node position lookup from the model's nodes.
    pub fn index_nodes(&mut self) {
        self.node_positions = self
            .model
            .nodes
            .iter()
            .map(|n| (n.header.handle, n.position))
            .collect();
    }

    pub fn node_position(&self, handle: Handle) -> Option<Vec3> {
        self.node_positions.get(&handle).copied()
    }

    /// Positions of `nodes`, or `None` with a diagnostic when any is missing.
    pub fn node_positions(
        &mut self,
        kind: EntityKind,
        owner: Handle,
        nodes: &[Handle],
    ) -> Option<Vec<Vec3>> {
        let mut positions = Vec::with_capacity(nodes.len());
        for node in nodes {
            match self.node_position(*node) {
                Some(p) => positions.push(p),
                None => {
                    self.diagnostics
                        .unresolved(kind, owner, format!("node {node} not found"));
                    return None;
                }
            }
        }
        Some(positions)
    }

    pub fn property_2d_axis_mode(&mut self, kind: EntityKind, owner: Handle, property: &Ref) -> AxisMode2D {
        let found = property.handle().and_then(|h| {
            self.model
                .properties_2d
                .iter()
                .find(|p| p.header.handle == h)
                .map(|p| p.axis_mode)
        });
        match found {
            Some(mode) => mode,
            None => {
                self.diagnostics.unresolved(
                    kind,
                    owner,
                    format!("2D property {property:?} not found, using local axis"),
                );
                AxisMode2D::Local
            }
        }
    }
}

/// State shared by the converters of a write pass.
///
/// Owns the model being written: converters that synthesize entities append
/// them here and the synthesized kind's converter, which runs later, writes
/// them out.
#[derive(Debug)]
pub struct WriteContext<'a> {
    pub config: &'a SyncConfig,
    pub model: Model,
    pub allocator: HandleAllocator,
    pub diagnostics: Diagnostics,
    nodes: NodeIndex,
    explicit_axes: usize,
    records: BTreeMap<EntityKind, Vec<GwaRecord>>,
}

impl<'a> WriteContext<'a> {
    pub fn new(config: &'a SyncConfig, mut model: Model, seeds: &[Seed]) -> Self {
        let mut allocator = HandleAllocator::with_seeds(seeds);
        for kind in EntityKind::ALL {
            for (space, header) in model.spaced_headers(kind) {
                allocator.reserve(space, header.handle);
            }
        }
        for mesh in &model.meshes {
            for handle in mesh.element_handles() {
                allocator.reserve(HandleSpace::Element, handle);
            }
        }

        let nodes = NodeIndex::build(&mut model.nodes, config.coincident_node_tolerance);
        let explicit_axes = model.axes.len();
        Self {
            config,
            model,
            allocator,
            diagnostics: Diagnostics::new(),
            nodes,
            explicit_axes,
            records: BTreeMap::new(),
        }
    }

    /// Handle of the node at `position`, creating the node when no node lies
    /// within tolerance.
    pub fn node_at(&mut self, position: Vec3) -> Result<Handle> {
        self.merge_node(Node::at(position))
    }

    /// Merges an implied node into the first node within tolerance, or adds
    /// it with a fresh handle.
    pub fn merge_node(&mut self, implied: Node) -> Result<Handle> {
        let index = match self.nodes.find(&self.model.nodes, &implied.position) {
            Some(index) => {
                self.model.nodes[index].merge(&implied);
                index
            }
            None => {
                let index = self.model.nodes.len();
                self.nodes.insert(index, &implied.position);
                self.model.nodes.push(implied);
                index
            }
        };
        self.assign_node(index)
    }

    /// Assigns the node at `index` its handle, once.
    pub fn assign_node(&mut self, index: usize) -> Result<Handle> {
        if self.nodes.is_assigned(index) {
            return Ok(self.model.nodes[index].header.handle);
        }
        let handle = self
            .allocator
            .assign(HandleSpace::Node, &mut self.model.nodes[index].header)?;
        self.nodes.mark_assigned(index);
        Ok(handle)
    }

    /// Survivor handle of a node handle given by the caller.
    pub fn canonical_node(&self, handle: Handle) -> Handle {
        self.nodes.canonical(handle)
    }

    /// Axes past this index were synthesized during the write.
    pub fn explicit_axes(&self) -> usize {
        self.explicit_axes
    }

    /// Resolves a reference to a single handle in `space`. Unresolvable
    /// references give `Handle::UNSET` and a diagnostic.
    pub fn resolve(&mut self, kind: EntityKind, owner: Handle, space: HandleSpace, reference: &Ref) -> Result<Handle> {
        Ok(self
            .resolve_all(kind, owner, space, std::slice::from_ref(reference))?
            .first()
            .copied()
            .unwrap_or(Handle::UNSET))
    }

    /// Resolves references to handles in `space`, in order. An application
    /// id may stand for several handles (a mesh for its elements).
    pub fn resolve_all(
        &mut self,
        kind: EntityKind,
        owner: Handle,
        space: HandleSpace,
        references: &[Ref],
    ) -> Result<Vec<Handle>> {
        let mut handles = Vec::with_capacity(references.len());
        for reference in references {
            match reference {
                Ref::Handle(handle) if space == HandleSpace::Node => {
                    handles.push(self.canonical_node(*handle));
                }
                Ref::Handle(handle) => handles.push(*handle),
                Ref::AppId(id) => {
                    let found = self.allocator.resolve(space, id).to_vec();
                    if !found.is_empty() {
                        handles.extend(found);
                    } else if space == HandleSpace::Node
                        && let Some(index) = self.nodes.folded_id(id)
                    {
                        handles.push(self.assign_node(index)?);
                    } else {
                        self.diagnostics.unresolved(
                            kind,
                            owner,
                            format!("no {space} entity with application id `{id}`"),
                        );
                    }
                }
            }
        }
        Ok(handles)
    }

    pub fn property_2d_axis_mode(&self, property: Handle) -> AxisMode2D {
        self.model
            .properties_2d
            .iter()
            .find(|p| p.header.handle == property)
            .map_or(AxisMode2D::Local, |p| p.axis_mode)
    }

    /// Queues a record for output, applying the configured version and
    /// stream tags.
    pub fn emit(&mut self, kind: EntityKind, mut record: GwaRecord) {
        if !self.config.version_tags {
            record.version = None;
        }
        record.set_tag(STREAM_ID_TAG, self.config.stream_id.as_deref());
        self.records.entry(kind).or_default().push(record);
    }

    pub fn records(&self, kind: EntityKind) -> &[GwaRecord] {
        self.records.get(&kind).map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// Consumes the context, returning the records ordered by `order` and the
    /// final model.
    pub fn finish(mut self, order: &[EntityKind]) -> (Vec<GwaRecord>, Model, Diagnostics) {
        let mut out = Vec::new();
        for kind in order {
            if let Some(records) = self.records.remove(kind) {
                out.extend(records);
            }
        }
        out.extend(self.records.into_values().flatten());
        (out, self.model, self.diagnostics)
    }
}
