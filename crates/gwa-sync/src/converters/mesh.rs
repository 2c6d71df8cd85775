//! Meshes have no record of their own. On read, edge-connected 2D elements
//! sharing a property and offset are folded into meshes; on write, meshes are
//! expanded back into `EL` records.

use std::collections::{HashMap, HashSet, VecDeque};

use gwa_model::{Element2D, EntityHeader, EntityKind, Handle, HandleSpace, Mesh};

use super::Converter;
use super::element::Element2DConverter;
use crate::context::{ReadContext, WriteContext};
use crate::error::Result;

pub struct MeshConverter;

impl MeshConverter {
    /// Splits `elements` into meshes and the elements left discrete.
    ///
    /// Only elements whose nodes all resolved take part. Meshes come out in
    /// order of their first element, faces in read order.
    pub fn consolidate(&self, elements: Vec<Element2D>) -> (Vec<Mesh>, Vec<Element2D>) {
        let mut buckets: Vec<Vec<usize>> = Vec::new();
        let mut bucket_of = HashMap::<(Handle, u64), usize>::new();
        let mut discrete = Vec::new();

        for (i, element) in elements.iter().enumerate() {
            let eligible = !element.coordinates.is_empty()
                && element.coordinates.len() == element.connectivity.len();
            if !eligible {
                discrete.push(i);
                continue;
            }
            let key = (
                element.property.handle().unwrap_or_default(),
                element.offset.to_bits(),
            );
            let slot = *bucket_of.entry(key).or_insert_with(|| {
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            buckets[slot].push(i);
        }

        let mut components: Vec<Vec<usize>> = Vec::new();
        for bucket in &buckets {
            components.extend(connected_components(&elements, bucket));
        }
        components.sort_by_key(|c| c[0]);

        let mut slots: Vec<Option<Element2D>> = elements.into_iter().map(Some).collect();
        let meshes = components
            .iter()
            .map(|component| {
                let faces: Vec<Element2D> =
                    component.iter().filter_map(|i| slots[*i].take()).collect();
                build_mesh(&faces)
            })
            .collect();
        let rest = discrete.into_iter().filter_map(|i| slots[i].take()).collect();
        (meshes, rest)
    }
}

/// Groups `members` (indices into `elements`) by shared edges. Each group is
/// sorted by index.
fn connected_components(elements: &[Element2D], members: &[usize]) -> Vec<Vec<usize>> {
    let mut by_edge = HashMap::<(Handle, Handle), Vec<usize>>::new();
    for &i in members {
        for edge in elements[i].edges() {
            by_edge.entry(edge).or_default().push(i);
        }
    }

    let mut seen = HashSet::new();
    let mut components = Vec::new();
    for &start in members {
        if !seen.insert(start) {
            continue;
        }
        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for edge in elements[current].edges() {
                for &next in by_edge.get(&edge).into_iter().flatten() {
                    if seen.insert(next) {
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }
    components
}

fn build_mesh(faces: &[Element2D]) -> Mesh {
    let first = &faces[0];
    let mut mesh = Mesh {
        header: EntityHeader {
            name: first.header.name.clone(),
            color: first.header.color,
            ..EntityHeader::default()
        },
        property: first.property.clone(),
        offset: first.offset,
        group: first.group,
        ..Mesh::default()
    };
    for face in faces {
        mesh.add_face(
            face.header.clone(),
            &face.coordinates,
            &face.connectivity,
            face.rotation,
        );
    }
    mesh.rebuild_edges();
    mesh
}

impl Converter for MeshConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Mesh
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[]
    }

    fn read(&self, _records: &[&gwa_record::GwaRecord], ctx: &mut ReadContext) {
        if !ctx.config.consolidate_meshes {
            return;
        }
        let elements = std::mem::take(&mut ctx.model.elements_2d);
        let count = elements.len();
        let (meshes, rest) = self.consolidate(elements);
        log::debug!(
            "consolidated {} of {count} 2D elements into {} meshes",
            count - rest.len(),
            meshes.len()
        );
        ctx.model.elements_2d = rest;
        ctx.model.meshes.extend(meshes);
    }

    /// Each face becomes one `EL` record; the mesh's application id then
    /// resolves to all of the face handles.
    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut meshes = std::mem::take(&mut ctx.model.meshes);
        for mesh in &mut meshes {
            let elements = mesh.expand();
            for (face, mut element) in elements.into_iter().enumerate() {
                if !Element2DConverter.write_element(ctx, self.kind(), &mut element)? {
                    continue;
                }
                let handle = element.header.handle;
                mesh.faces[face].header.handle = handle;
                for (vertex, node) in mesh.faces[face].vertices.clone().into_iter().zip(&element.connectivity) {
                    mesh.vertex_nodes[vertex] = *node;
                }
                mesh.property = element.property.clone();
                if let Some(id) = &mesh.header.application_id {
                    ctx.allocator.register(HandleSpace::Element, id, handle);
                }
            }
        }
        ctx.model.meshes = meshes;
        Ok(())
    }
}
