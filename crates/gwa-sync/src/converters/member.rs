use gwa_model::{
    EntityHeader, EntityKind, Handle, HandleSpace, Member1D, Member2D, MemberCategory, Ref, Vec3,
};
use gwa_record::{GwaRecord, RecordError};

use super::{Converter, read_header, record_handle, set_record};
use crate::context::{ReadContext, WriteContext};
use crate::error::Result;

const MEMB: &str = "MEMB.8";

/// `MEMB   handle, name, color, type, property, group, "topology",
/// orient-node, orient-angle, offset`
///
/// The topology is a single quoted field of space separated node handles.
#[derive(Debug, Clone, PartialEq)]
struct MemberRecord {
    header: EntityHeader,
    category: MemberCategory,
    property: Handle,
    group: u32,
    topology: Vec<Handle>,
    orientation_node: Handle,
    rotation: f64,
    offset: f64,
}

impl MemberRecord {
    fn parse(record: &GwaRecord) -> std::result::Result<Self, RecordError> {
        record.expect_len(9)?;
        let token = record.field(3)?;
        let category = MemberCategory::from_token(token).ok_or_else(|| record.unknown_token(token))?;

        let text = record.text(6)?;
        let topology = text
            .split_whitespace()
            .map(|h| {
                h.parse::<Handle>().map_err(|_| RecordError::FieldType {
                    keyword: record.keyword.clone(),
                    index: 6,
                    value: text.clone(),
                    expected: "node list",
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            header: read_header(record, Some(2))?,
            category,
            property: record.handle(4)?,
            group: record.unsigned(5)?,
            topology,
            orientation_node: record.handle(7)?,
            rotation: record.float(8)?,
            offset: if record.fields.len() > 9 { record.float(9)? } else { 0.0 },
        })
    }

    fn encode(&self) -> GwaRecord {
        let topology: Vec<String> = self.topology.iter().map(Handle::to_string).collect();
        let mut record = set_record(MEMB, &self.header);
        record
            .push(self.header.handle)
            .push_text(&self.header.name)
            .push_color(self.header.color)
            .push(self.category.token())
            .push(self.property)
            .push(self.group)
            .push(format!("\"{}\"", topology.join(" ")))
            .push(self.orientation_node)
            .push(self.rotation)
            .push(self.offset);
        record
    }
}

fn select<'r>(records: &[&'r GwaRecord], two_d: bool) -> Vec<&'r GwaRecord> {
    records
        .iter()
        .filter(|r| {
            r.field(3)
                .ok()
                .and_then(MemberCategory::from_token)
                .is_none_or(|c| c.is_2d() == two_d)
        })
        .copied()
        .collect()
}

fn check_property(ctx: &mut ReadContext, kind: EntityKind, owner: Handle, property: &Ref, found: bool) {
    if !found {
        ctx.diagnostics
            .unresolved(kind, owner, format!("property {property:?} not found"));
    }
}

/// Node handles for a member being written: coordinates become nodes,
/// otherwise the topology is kept with merged nodes folded in.
fn write_topology(ctx: &mut WriteContext, coordinates: &[Vec3], topology: &[Handle]) -> Result<Vec<Handle>> {
    if coordinates.is_empty() {
        return Ok(topology.iter().map(|h| ctx.canonical_node(*h)).collect());
    }
    coordinates.iter().map(|p| ctx.node_at(*p)).collect()
}

/// Checks the node count a member will be written with, before any handle or
/// node is created for it.
fn enough_nodes(
    ctx: &mut WriteContext,
    kind: EntityKind,
    owner: Handle,
    coordinates: &[Vec3],
    topology: &[Handle],
    minimum: usize,
) -> bool {
    let (count, usable) = if coordinates.is_empty() {
        (topology.len(), topology.iter().all(|h| h.is_set()))
    } else {
        (coordinates.len(), true)
    };
    if usable && count >= minimum {
        return true;
    }
    ctx.diagnostics.unresolved(
        kind,
        owner,
        format!("member has {count} nodes, needs {minimum}; skipped"),
    );
    false
}

/// 1D design members: beams, columns and generic 1D.
pub struct Member1DConverter;

impl Member1DConverter {
    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<Member1D, RecordError> {
        let parsed = MemberRecord::parse(record)?;
        if parsed.category.is_2d() {
            return Err(record.unknown_token(parsed.category.token()));
        }
        Ok(Member1D {
            header: parsed.header,
            category: parsed.category,
            property: Ref::Handle(parsed.property),
            group: parsed.group,
            topology: parsed.topology,
            coordinates: Vec::new(),
            orientation_node: parsed.orientation_node,
            rotation: parsed.rotation,
        })
    }

    pub fn serialize(&self, member: &Member1D) -> GwaRecord {
        MemberRecord {
            header: member.header.clone(),
            category: member.category,
            property: member.property.handle().unwrap_or_default(),
            group: member.group,
            topology: member.topology.clone(),
            orientation_node: member.orientation_node,
            rotation: member.rotation,
            offset: 0.0,
        }
        .encode()
    }
}

impl Converter for Member1DConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Member1D
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[MEMB]
    }

    /// Records with an unknown member type are reported here only.
    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in select(records, false) {
            let mut member = match self.parse(record) {
                Ok(member) => member,
                Err(err) => {
                    ctx.diagnostics.malformed(Some(self.kind()), record_handle(record), &err);
                    continue;
                }
            };
            let handle = member.header.handle;
            let property = member.property.handle();
            let found = ctx.model.sections.iter().any(|p| Some(p.header.handle) == property);
            check_property(ctx, self.kind(), handle, &member.property, found);
            if let Some(coordinates) = ctx.node_positions(self.kind(), handle, &member.topology) {
                member.coordinates = coordinates;
            }
            ctx.model.members_1d.push(member);
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut members = std::mem::take(&mut ctx.model.members_1d);
        for member in &mut members {
            let owner = member.header.handle;
            if !enough_nodes(ctx, self.kind(), owner, &member.coordinates, &member.topology, 2) {
                continue;
            }
            let handle = ctx.allocator.assign(HandleSpace::Member, &mut member.header)?;
            let property = ctx.resolve(self.kind(), handle, HandleSpace::Property1D, &member.property)?;
            member.property = Ref::Handle(property);
            member.topology = write_topology(ctx, &member.coordinates, &member.topology)?;
            member.orientation_node = ctx.canonical_node(member.orientation_node);
            ctx.emit(self.kind(), self.serialize(member));
        }
        ctx.model.members_1d = members;
        Ok(())
    }
}

/// 2D design members: slabs, walls and generic 2D.
pub struct Member2DConverter;

impl Member2DConverter {
    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<Member2D, RecordError> {
        let parsed = MemberRecord::parse(record)?;
        if !parsed.category.is_2d() {
            return Err(record.unknown_token(parsed.category.token()));
        }
        Ok(Member2D {
            header: parsed.header,
            category: parsed.category,
            property: Ref::Handle(parsed.property),
            group: parsed.group,
            topology: parsed.topology,
            coordinates: Vec::new(),
            rotation: parsed.rotation,
            offset: parsed.offset,
        })
    }

    pub fn serialize(&self, member: &Member2D) -> GwaRecord {
        MemberRecord {
            header: member.header.clone(),
            category: member.category,
            property: member.property.handle().unwrap_or_default(),
            group: member.group,
            topology: member.topology.clone(),
            orientation_node: Handle::UNSET,
            rotation: member.rotation,
            offset: member.offset,
        }
        .encode()
    }
}

impl Converter for Member2DConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Member2D
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[MEMB]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in records {
            let two_d = record
                .field(3)
                .ok()
                .and_then(MemberCategory::from_token)
                .is_some_and(MemberCategory::is_2d);
            if !two_d {
                continue;
            }
            let mut member = match self.parse(record) {
                Ok(member) => member,
                Err(err) => {
                    ctx.diagnostics.malformed(Some(self.kind()), record_handle(record), &err);
                    continue;
                }
            };
            let handle = member.header.handle;
            let property = member.property.handle();
            let found = ctx.model.properties_2d.iter().any(|p| Some(p.header.handle) == property);
            check_property(ctx, self.kind(), handle, &member.property, found);
            if let Some(coordinates) = ctx.node_positions(self.kind(), handle, &member.topology) {
                member.coordinates = coordinates;
            }
            ctx.model.members_2d.push(member);
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut members = std::mem::take(&mut ctx.model.members_2d);
        for member in &mut members {
            let owner = member.header.handle;
            if !enough_nodes(ctx, self.kind(), owner, &member.coordinates, &member.topology, 3) {
                continue;
            }
            let handle = ctx.allocator.assign(HandleSpace::Member, &mut member.header)?;
            let property = ctx.resolve(self.kind(), handle, HandleSpace::Property2D, &member.property)?;
            member.property = Ref::Handle(property);
            member.topology = write_topology(ctx, &member.coordinates, &member.topology)?;
            ctx.emit(self.kind(), self.serialize(member));
        }
        ctx.model.members_2d = members;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use gwa_model::Model;

    use super::*;
    use crate::config::SyncConfig;

    #[test]
    fn slab_topology_is_one_quoted_field() {
        let line = "SET\tMEMB.8\t4\tfloor\tNO_RGB\tSLAB\t2\t0\t\"1 2 3 4\"\t0\t0\t0.05";
        let member = Member2DConverter.parse(&GwaRecord::parse(line).unwrap()).unwrap();
        assert_eq!(member.topology, vec![Handle(1), Handle(2), Handle(3), Handle(4)]);
        assert_eq!(member.offset, 0.05);

        let record = Member2DConverter.serialize(&member);
        assert_eq!(record.fields[6], "\"1 2 3 4\"");
        assert_eq!(Member2DConverter.parse(&record).unwrap(), member);
    }

    #[test]
    fn column_is_not_a_2d_member() {
        let line = "SET\tMEMB.8\t1\tc\tNO_RGB\tCOLUMN\t1\t0\t\"1 2\"\t3\t90";
        let record = GwaRecord::parse(line).unwrap();
        let member = Member1DConverter.parse(&record).unwrap();
        assert_eq!(member.orientation_node, Handle(3));
        assert_eq!(member.rotation, 90.0);
        assert!(Member2DConverter.parse(&record).is_err());
    }

    #[test]
    fn bad_topology_is_malformed() {
        let line = "SET\tMEMB.8\t1\tc\tNO_RGB\tBEAM\t1\t0\t\"1 x\"\t0\t0";
        assert!(matches!(
            Member1DConverter.parse(&GwaRecord::parse(line).unwrap()),
            Err(RecordError::FieldType { index: 6, .. })
        ));
    }

    #[test]
    fn negative_group_is_malformed() {
        let line = "SET\tMEMB.8\t1\tc\tNO_RGB\tBEAM\t1\t-1\t\"1 2\"\t0\t0";
        assert!(matches!(
            Member1DConverter.parse(&GwaRecord::parse(line).unwrap()),
            Err(RecordError::FieldType { index: 5, .. })
        ));
    }

    #[test]
    fn member_with_one_point_leaves_no_nodes_behind() {
        let config = SyncConfig::default();
        let mut member = Member1D::new(0, MemberCategory::Beam, Ref::from(Handle(1)), &[]);
        member.coordinates = vec![Vec3::new(3.0, 0.0, 0.0)];
        let mut model = Model::new();
        model.members_1d.push(member);

        let mut ctx = WriteContext::new(&config, model, &[]);
        Member1DConverter.write(&mut ctx).unwrap();
        assert!(ctx.records(EntityKind::Member1D).is_empty());
        assert!(ctx.model.nodes.is_empty());
        assert!(!ctx.allocator.is_claimed(HandleSpace::Member, Handle(1)));
    }
}
