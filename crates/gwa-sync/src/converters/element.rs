//! `EL` records. 0D, 1D and 2D elements share the keyword and one handle
//! space; the type token decides which converter owns a record.

use gwa_model::axis::{
    angle_1d, angle_1d_oriented, angle_2d, axis_1d, axis_1d_oriented, axis_2d, clean_angle,
};
use gwa_model::{
    Element0D, Element1D, Element2D, ElementCategory, EndRelease, EntityHeader, EntityKind,
    Handle, HandleSpace, Ref, Release, Vec3,
};
use gwa_record::{GwaRecord, RecordError, parse_release_code};

use super::{Converter, read_header, record_handle, set_record};
use crate::context::{ReadContext, WriteContext};
use crate::error::Result;

pub(crate) const EL: &str = "EL.4";
const NO_RLS: &str = "NO_RLS";
const RLS: &str = "RLS";

/// Positional content of one `EL` record:
///
/// `handle, name, color, type, property, group, topo..., orient-node,
/// orient-angle, NO_RLS | RLS end1 end2 [k...], off-x1, off-x2, off-y, off-z`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ElementRecord {
    pub header: EntityHeader,
    pub category: ElementCategory,
    pub property: Handle,
    pub group: u32,
    pub topology: Vec<Handle>,
    pub orientation_node: Handle,
    pub rotation: f64,
    pub releases: Option<[EndRelease; 2]>,
    pub offsets: [f64; 4],
}

impl ElementRecord {
    pub fn new(header: EntityHeader, category: ElementCategory) -> Self {
        Self {
            header,
            category,
            property: Handle::UNSET,
            group: 0,
            topology: Vec::new(),
            orientation_node: Handle::UNSET,
            rotation: 0.0,
            releases: None,
            offsets: [0.0; 4],
        }
    }

    pub fn parse(record: &GwaRecord) -> std::result::Result<Self, RecordError> {
        let category = element_category(record)?;
        let n = category.num_nodes();
        let after_topology = 6 + n;
        record.expect_len(after_topology + 3)?;

        let topology = (6..after_topology)
            .map(|i| record.handle(i))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let flag = record.field(after_topology + 2)?;
        let (releases, mut at) = match flag.to_ascii_uppercase().as_str() {
            NO_RLS => (None, after_topology + 3),
            RLS => {
                let codes = [
                    parse_release_code(record.field(after_topology + 3)?)?,
                    parse_release_code(record.field(after_topology + 4)?)?,
                ];
                let mut at = after_topology + 5;
                let mut ends = [EndRelease::default(); 2];
                for (end, code) in ends.iter_mut().zip(codes) {
                    let mut dofs = [Release::Fixed; 6];
                    for (dof, flag) in dofs.iter_mut().zip(code) {
                        *dof = match flag {
                            b'R' => Release::Released,
                            b'K' => {
                                at += 1;
                                Release::Stiffness(record.float(at - 1)?)
                            }
                            _ => Release::Fixed,
                        };
                    }
                    *end = EndRelease::from_array(dofs);
                }
                (Some(ends), at)
            }
            _ => return Err(record.unknown_token(flag)),
        };

        let mut offsets = [0.0; 4];
        for offset in offsets.iter_mut() {
            if record.fields.len() > at {
                *offset = record.float(at)?;
            }
            at += 1;
        }

        Ok(Self {
            header: read_header(record, Some(2))?,
            category,
            property: record.handle(4)?,
            group: record.unsigned(5)?,
            topology,
            orientation_node: record.handle(after_topology)?,
            rotation: record.float(after_topology + 1)?,
            releases,
            offsets,
        })
    }

    pub fn encode(&self) -> GwaRecord {
        let mut record = set_record(EL, &self.header);
        record
            .push(self.header.handle)
            .push_text(&self.header.name)
            .push_color(self.header.color)
            .push(self.category.token())
            .push(self.property)
            .push(self.group);
        for node in &self.topology {
            record.push(node);
        }
        record.push(self.orientation_node).push(self.rotation);

        match self.releases.filter(|ends| ends.iter().any(is_released)) {
            None => {
                record.push(NO_RLS);
            }
            Some(ends) => {
                record.push(RLS);
                let mut springs = Vec::new();
                for end in &ends {
                    let code: String = end
                        .to_array()
                        .iter()
                        .map(|r| match r {
                            Release::Fixed => 'F',
                            Release::Released => 'R',
                            Release::Stiffness(k) => {
                                springs.push(*k);
                                'K'
                            }
                        })
                        .collect();
                    record.push(code);
                }
                for k in springs {
                    record.push(k);
                }
            }
        }
        for offset in self.offsets {
            record.push(offset);
        }
        record
    }
}

fn is_released(end: &EndRelease) -> bool {
    end.to_array().iter().any(|r| *r != Release::Fixed)
}

fn element_category(record: &GwaRecord) -> std::result::Result<ElementCategory, RecordError> {
    let token = record.field(3)?;
    ElementCategory::from_token(token).ok_or_else(|| record.unknown_token(token))
}

/// Records whose type token has the given dimension. Records with an unknown
/// type are reported by the 0D reader, which runs first.
fn select<'r>(
    records: &[&'r GwaRecord],
    dimension: u8,
    kind: EntityKind,
    ctx: &mut ReadContext,
) -> Vec<&'r GwaRecord> {
    let mut selected = Vec::new();
    for record in records {
        match element_category(record) {
            Ok(category) if category.dimension() == dimension => selected.push(*record),
            Ok(_) => {}
            Err(err) => {
                if dimension == 0 {
                    ctx.diagnostics.malformed(Some(kind), record_handle(record), &err);
                }
            }
        }
    }
    selected
}

fn wrong_dimension(record: &GwaRecord, category: ElementCategory) -> RecordError {
    record.unknown_token(category.token())
}

/// Node handles for an element being written: coordinates are matched or
/// turned into nodes, otherwise the given connectivity is used.
fn write_connectivity(
    ctx: &mut WriteContext,
    coordinates: &[Vec3],
    connectivity: &[Handle],
) -> Result<Vec<Handle>> {
    if coordinates.is_empty() {
        return Ok(connectivity.iter().map(|h| ctx.canonical_node(*h)).collect());
    }
    coordinates.iter().map(|p| ctx.node_at(*p)).collect()
}

/// Corner positions for angle recovery on write.
fn corner_positions(ctx: &WriteContext, coordinates: &[Vec3], connectivity: &[Handle]) -> Option<Vec<Vec3>> {
    if !coordinates.is_empty() {
        return Some(coordinates.to_vec());
    }
    connectivity
        .iter()
        .map(|h| ctx.model.node(*h).map(|n| n.position))
        .collect()
}

fn check_property(ctx: &mut ReadContext, kind: EntityKind, owner: Handle, property: Handle, found: bool) {
    if property.is_set() && !found {
        ctx.diagnostics
            .unresolved(kind, owner, format!("property {property} not found"));
    }
}

/// Checks the node count an element will be written with against the counts
/// its category allows, before any handle or node is created for it.
pub(crate) fn check_node_count(
    ctx: &mut WriteContext,
    kind: EntityKind,
    owner: Handle,
    coordinates: &[Vec3],
    connectivity: &[Handle],
    expected: &[usize],
) -> bool {
    let (count, usable) = if coordinates.is_empty() {
        (connectivity.len(), connectivity.iter().all(|h| h.is_set()))
    } else {
        (coordinates.len(), true)
    };
    if usable && expected.contains(&count) {
        return true;
    }
    ctx.diagnostics.unresolved(
        kind,
        owner,
        format!("element has {count} nodes, expected {expected:?}; skipped"),
    );
    false
}

/// `EL` records of type `MASS`.
pub struct Element0DConverter;

impl Element0DConverter {
    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<Element0D, RecordError> {
        let parsed = ElementRecord::parse(record)?;
        if parsed.category.dimension() != 0 {
            return Err(wrong_dimension(record, parsed.category));
        }
        Ok(Element0D {
            header: parsed.header,
            property: Ref::Handle(parsed.property),
            group: parsed.group,
            connectivity: parsed.topology,
            coordinates: Vec::new(),
        })
    }

    pub fn serialize(&self, element: &Element0D) -> GwaRecord {
        let mut parsed = ElementRecord::new(element.header.clone(), ElementCategory::Mass);
        parsed.property = element.property.handle().unwrap_or_default();
        parsed.group = element.group;
        parsed.topology = element.connectivity.clone();
        parsed.encode()
    }
}

impl Converter for Element0DConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Element0D
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[EL]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in select(records, 0, self.kind(), ctx) {
            let mut element = match self.parse(record) {
                Ok(element) => element,
                Err(err) => {
                    ctx.diagnostics.malformed(Some(self.kind()), record_handle(record), &err);
                    continue;
                }
            };
            let handle = element.header.handle;
            let property = element.property.handle().unwrap_or_default();
            let found = ctx.model.mass_properties.iter().any(|p| p.header.handle == property);
            check_property(ctx, self.kind(), handle, property, found);
            if let Some(coordinates) = ctx.node_positions(self.kind(), handle, &element.connectivity) {
                element.coordinates = coordinates;
            }
            ctx.model.elements_0d.push(element);
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut elements = std::mem::take(&mut ctx.model.elements_0d);
        for element in &mut elements {
            let coordinates: Vec<Vec3> = element.coordinates.iter().take(1).copied().collect();
            let owner = element.header.handle;
            if !check_node_count(ctx, self.kind(), owner, &coordinates, &element.connectivity, &[1]) {
                continue;
            }
            let handle = ctx.allocator.assign(HandleSpace::Element, &mut element.header)?;
            let property = ctx.resolve(self.kind(), handle, HandleSpace::PropertyMass, &element.property)?;
            element.property = Ref::Handle(property);
            element.connectivity = write_connectivity(ctx, &coordinates, &element.connectivity)?;
            ctx.emit(self.kind(), self.serialize(element));
        }
        ctx.model.elements_0d = elements;
        Ok(())
    }
}

/// `EL` records of type `BEAM`, `BAR`, `ROD`, `STRUT` and `TIE`.
pub struct Element1DConverter;

impl Element1DConverter {
    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<Element1D, RecordError> {
        let parsed = ElementRecord::parse(record)?;
        if parsed.category.dimension() != 1 {
            return Err(wrong_dimension(record, parsed.category));
        }
        Ok(Element1D {
            header: parsed.header,
            category: parsed.category,
            property: Ref::Handle(parsed.property),
            group: parsed.group,
            connectivity: parsed.topology,
            coordinates: Vec::new(),
            orientation_node: parsed.orientation_node,
            orientation_point: None,
            rotation: parsed.rotation,
            releases: parsed.releases,
            local_axis: None,
        })
    }

    pub fn serialize(&self, element: &Element1D) -> GwaRecord {
        let mut parsed = ElementRecord::new(element.header.clone(), element.category);
        parsed.property = element.property.handle().unwrap_or_default();
        parsed.group = element.group;
        parsed.topology = element.connectivity.clone();
        parsed.orientation_node = element.orientation_node;
        parsed.rotation = element.rotation;
        parsed.releases = element.releases;
        parsed.encode()
    }
}

impl Converter for Element1DConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Element1D
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[EL]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in select(records, 1, self.kind(), ctx) {
            let mut element = match self.parse(record) {
                Ok(element) => element,
                Err(err) => {
                    ctx.diagnostics.malformed(Some(self.kind()), record_handle(record), &err);
                    continue;
                }
            };
            let handle = element.header.handle;
            let property = element.property.handle().unwrap_or_default();
            let found = ctx.model.sections.iter().any(|p| p.header.handle == property);
            check_property(ctx, self.kind(), handle, property, found);

            if let Some(coordinates) = ctx.node_positions(self.kind(), handle, &element.connectivity) {
                if element.orientation_node.is_set() {
                    element.orientation_point = ctx.node_position(element.orientation_node);
                    if element.orientation_point.is_none() {
                        ctx.diagnostics.unresolved(
                            self.kind(),
                            handle,
                            format!("orientation node {} not found", element.orientation_node),
                        );
                    }
                }
                let (start, end) = (coordinates[0], coordinates[1]);
                element.local_axis = Some(match element.orientation_point {
                    Some(reference) => axis_1d_oriented(&start, &end, &reference, element.rotation),
                    None => axis_1d(&start, &end, element.rotation),
                });
                element.coordinates = coordinates;
            }
            ctx.model.elements_1d.push(element);
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut elements = std::mem::take(&mut ctx.model.elements_1d);
        for element in &mut elements {
            let owner = element.header.handle;
            if !check_node_count(ctx, self.kind(), owner, &element.coordinates, &element.connectivity, &[2]) {
                continue;
            }
            let handle = ctx.allocator.assign(HandleSpace::Element, &mut element.header)?;
            let property = ctx.resolve(self.kind(), handle, HandleSpace::Property1D, &element.property)?;
            element.property = Ref::Handle(property);
            element.connectivity = write_connectivity(ctx, &element.coordinates, &element.connectivity)?;
            element.orientation_node = match element.orientation_point {
                Some(point) => ctx.node_at(point)?,
                None => ctx.canonical_node(element.orientation_node),
            };

            if let Some(axis) = element.local_axis
                && let Some(ends) = corner_positions(ctx, &element.coordinates, &element.connectivity)
            {
                let reference = element
                    .orientation_point
                    .or_else(|| ctx.model.node(element.orientation_node).map(|n| n.position));
                let angle = match reference {
                    Some(reference) => angle_1d_oriented(&ends[0], &ends[1], &reference, &axis),
                    None => angle_1d(&ends[0], &ends[1], &axis),
                };
                element.rotation = clean_angle(angle);
            }
            ctx.emit(self.kind(), self.serialize(element));
        }
        ctx.model.elements_1d = elements;
        Ok(())
    }
}

/// `EL` records of type `TRI3` and `QUAD4`.
pub struct Element2DConverter;

impl Element2DConverter {
    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<Element2D, RecordError> {
        let parsed = ElementRecord::parse(record)?;
        if parsed.category.dimension() != 2 {
            return Err(wrong_dimension(record, parsed.category));
        }
        Ok(Element2D {
            header: parsed.header,
            category: parsed.category,
            property: Ref::Handle(parsed.property),
            group: parsed.group,
            connectivity: parsed.topology,
            coordinates: Vec::new(),
            rotation: parsed.rotation,
            offset: parsed.offsets[3],
            local_axis: None,
        })
    }

    pub fn serialize(&self, element: &Element2D) -> GwaRecord {
        let mut parsed = ElementRecord::new(element.header.clone(), element.category);
        parsed.property = element.property.handle().unwrap_or_default();
        parsed.group = element.group;
        parsed.topology = element.connectivity.clone();
        parsed.rotation = element.rotation;
        parsed.offsets[3] = element.offset;
        parsed.encode()
    }

    /// Writes one face element; shared with the mesh writer.
    pub(crate) fn write_element(
        &self,
        ctx: &mut WriteContext,
        kind: EntityKind,
        element: &mut Element2D,
    ) -> Result<bool> {
        let owner = element.header.handle;
        if !check_node_count(ctx, kind, owner, &element.coordinates, &element.connectivity, &[3, 4]) {
            return Ok(false);
        }
        let handle = ctx.allocator.assign(HandleSpace::Element, &mut element.header)?;
        let property = ctx.resolve(kind, handle, HandleSpace::Property2D, &element.property)?;
        element.property = Ref::Handle(property);
        element.connectivity = write_connectivity(ctx, &element.coordinates, &element.connectivity)?;
        element.category =
            ElementCategory::for_face(element.connectivity.len()).unwrap_or(element.category);

        if let Some(axis) = element.local_axis
            && let Some(corners) = corner_positions(ctx, &element.coordinates, &element.connectivity)
        {
            let mode = ctx.property_2d_axis_mode(property);
            element.rotation = clean_angle(angle_2d(&corners, mode, &axis));
        }
        ctx.emit(kind, self.serialize(element));
        Ok(true)
    }
}

impl Converter for Element2DConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Element2D
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[EL]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in select(records, 2, self.kind(), ctx) {
            let mut element = match self.parse(record) {
                Ok(element) => element,
                Err(err) => {
                    ctx.diagnostics.malformed(Some(self.kind()), record_handle(record), &err);
                    continue;
                }
            };
            let handle = element.header.handle;
            let mode = ctx.property_2d_axis_mode(self.kind(), handle, &element.property);
            if let Some(corners) = ctx.node_positions(self.kind(), handle, &element.connectivity) {
                element.local_axis = Some(axis_2d(&corners, mode, element.rotation));
                element.coordinates = corners;
            }
            ctx.model.elements_2d.push(element);
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut elements = std::mem::take(&mut ctx.model.elements_2d);
        for element in &mut elements {
            self.write_element(ctx, self.kind(), element)?;
        }
        ctx.model.elements_2d = elements;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use gwa_model::Model;

    use super::*;
    use crate::config::SyncConfig;

    fn parse(line: &str) -> GwaRecord {
        GwaRecord::parse(line).unwrap()
    }

    #[test]
    fn beam_with_releases() {
        let line = "SET\tEL.4\t12\tb1\tNO_RGB\tBEAM\t3\t1\t4\t5\t0\t15\tRLS\tFFFFRR\tFFFFFK\t2500\t0\t0\t0\t0";
        let element = Element1DConverter.parse(&parse(line)).unwrap();
        assert_eq!(element.connectivity, vec![Handle(4), Handle(5)]);
        assert_eq!(element.rotation, 15.0);
        let [start, end] = element.releases.unwrap();
        assert_eq!(start.yy, Release::Released);
        assert_eq!(start.x, Release::Fixed);
        assert_eq!(end.zz, Release::Stiffness(2500.0));

        let again = Element1DConverter.parse(&Element1DConverter.serialize(&element)).unwrap();
        assert_eq!(again, element);
    }

    #[test]
    fn quad_keeps_its_offset() {
        let line = "SET\tEL.4\t3\t\"\"\tNO_RGB\tQUAD4\t1\t0\t1\t2\t3\t4\t0\t30\tNO_RLS\t0\t0\t0\t0.125";
        let element = Element2DConverter.parse(&parse(line)).unwrap();
        assert_eq!(element.category, ElementCategory::Quad4);
        assert_eq!(element.offset, 0.125);
        assert_eq!(element.rotation, 30.0);
        assert!(Element1DConverter.parse(&parse(line)).is_err());
    }

    #[test]
    fn mass_element_has_one_node() {
        let line = "SET\tEL.4\t9\tm\tNO_RGB\tMASS\t2\t0\t17\t0\t0\tNO_RLS\t0\t0\t0\t0";
        let element = Element0DConverter.parse(&parse(line)).unwrap();
        assert_eq!(element.connectivity, vec![Handle(17)]);
        assert_eq!(element.property, Ref::from(Handle(2)));
    }

    #[test]
    fn unknown_release_flag_is_malformed() {
        let line = "SET\tEL.4\t1\tb\tNO_RGB\tBAR\t1\t0\t1\t2\t0\t0\tPINNED";
        assert!(matches!(
            Element1DConverter.parse(&parse(line)),
            Err(RecordError::UnknownToken { .. })
        ));
    }

    #[test]
    fn negative_group_is_malformed() {
        let line = "SET\tEL.4\t1\tb\tNO_RGB\tBEAM\t1\t-2\t1\t2\t0\t0\tNO_RLS";
        assert!(matches!(
            Element1DConverter.parse(&parse(line)),
            Err(RecordError::FieldType { index: 5, .. })
        ));
    }

    #[test]
    fn misshapen_beam_leaves_no_nodes_behind() {
        let config = SyncConfig::default();
        let mut beam = Element1D::between(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Ref::from(Handle(1)));
        beam.coordinates.push(Vec3::new(2.0, 0.0, 0.0));
        let mut model = Model::new();
        model.elements_1d.push(beam);

        let mut ctx = WriteContext::new(&config, model, &[]);
        Element1DConverter.write(&mut ctx).unwrap();
        assert!(ctx.records(EntityKind::Element1D).is_empty());
        assert!(ctx.model.nodes.is_empty());
        assert!(!ctx.allocator.is_claimed(HandleSpace::Element, Handle(1)));
        assert_eq!(ctx.diagnostics.len(), 1);
    }
}
