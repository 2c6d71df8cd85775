use gwa_model::{
    Axis, AxisDefinition, EntityHeader, EntityKind, Handle, HandleSpace, Node, NodeAxis, Restraint,
    Stiffness, Vec3,
};
use gwa_record::{GwaRecord, RecordError, format_restraint, parse_restraint};

use super::{Converter, read_header, record_handle, set_record};
use crate::context::{ReadContext, WriteContext};
use crate::error::Result;

const NODE: &str = "NODE.3";
const GLOBAL: &str = "GLOBAL";
const AXIS_TOLERANCE: f64 = 1e-9;

/// `NODE   handle, name, color, x, y, z, restraint, axis, kx, ky, kz, kxx,
/// kyy, kzz, mass`
///
/// Everything after the coordinates may be omitted and then takes its
/// default (free, global axis, no springs, no mass).
pub struct NodeConverter;

impl NodeConverter {
    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<Node, RecordError> {
        record.expect_len(6)?;
        let has = |index: usize| record.fields.len() > index;

        let restraint = if has(6) {
            Restraint::from_array(parse_restraint(record.field(6)?)?)
        } else {
            Restraint::default()
        };
        let axis = if has(7) {
            let token = record.field(7)?;
            if token.eq_ignore_ascii_case(GLOBAL) {
                NodeAxis::Global
            } else {
                match record.handle(7)? {
                    Handle::UNSET => NodeAxis::Global,
                    handle => NodeAxis::Ref(handle),
                }
            }
        } else {
            NodeAxis::Global
        };
        let mut stiffness = [0.0; 6];
        for (i, k) in stiffness.iter_mut().enumerate() {
            if has(8 + i) {
                *k = record.float(8 + i)?;
            }
        }
        let mass = if has(14) { record.float(14)? } else { 0.0 };

        Ok(Node {
            header: read_header(record, Some(2))?,
            position: Vec3::new(record.float(3)?, record.float(4)?, record.float(5)?),
            axis,
            restraint,
            stiffness: Stiffness::from_array(stiffness),
            mass,
        })
    }

    /// Explicit axes are written as `GLOBAL`; the write pass replaces them
    /// with a reference to an axis record first.
    pub fn serialize(&self, node: &Node) -> GwaRecord {
        let mut record = set_record(NODE, &node.header);
        record
            .push(node.header.handle)
            .push_text(&node.header.name)
            .push_color(node.header.color)
            .push(node.position.x)
            .push(node.position.y)
            .push(node.position.z)
            .push(format_restraint(node.restraint.to_array()));
        match node.axis {
            NodeAxis::Ref(handle) if handle.is_set() => record.push(handle),
            _ => record.push(GLOBAL),
        };
        for k in node.stiffness.to_array() {
            record.push(k);
        }
        record.push(node.mass);
        record
    }

    /// Handle of an axis record matching `axis`, adding one when none does.
    fn axis_handle(ctx: &mut WriteContext, axis: &Axis) -> Result<Handle> {
        let existing = ctx.model.axes.iter().find(|d| {
            d.header.handle.is_set()
                && d.axis.same_directions(axis, AXIS_TOLERANCE)
                && (d.axis.origin - axis.origin).norm() <= AXIS_TOLERANCE
        });
        if let Some(definition) = existing {
            return Ok(definition.header.handle);
        }
        let mut definition = AxisDefinition {
            header: EntityHeader::default(),
            axis: *axis,
        };
        let handle = ctx.allocator.assign(HandleSpace::Axis, &mut definition.header)?;
        log::debug!("synthesized axis {handle} for a node");
        ctx.model.axes.push(definition);
        Ok(handle)
    }
}

impl Converter for NodeConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Node
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[NODE]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in records {
            let mut node = match self.parse(record) {
                Ok(node) => node,
                Err(err) => {
                    ctx.diagnostics
                        .malformed(Some(self.kind()), record_handle(record), &err);
                    continue;
                }
            };
            if let NodeAxis::Ref(axis) = node.axis {
                node.axis = match ctx.model.axes.iter().find(|a| a.header.handle == axis) {
                    Some(definition) => NodeAxis::Explicit(definition.axis),
                    None => {
                        ctx.diagnostics.unresolved(
                            self.kind(),
                            node.header.handle,
                            format!("axis {axis} not found, using global axis"),
                        );
                        NodeAxis::Global
                    }
                };
            }
            ctx.model.nodes.push(node);
        }
        ctx.index_nodes();
    }

    /// Writes explicit nodes and the nodes synthesized by element and member
    /// writers. Custom node axes become axis records.
    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        for index in 0..ctx.model.nodes.len() {
            ctx.assign_node(index)?;
            let mut node = ctx.model.nodes[index].clone();
            if let NodeAxis::Explicit(axis) = node.axis {
                node.axis = if axis.is_global(AXIS_TOLERANCE) {
                    NodeAxis::Global
                } else {
                    NodeAxis::Ref(Self::axis_handle(ctx, &axis)?)
                };
            }
            ctx.emit(self.kind(), self.serialize(&node));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_node_record() {
        let line = "SET\tNODE.3:{speckle_app_id:pt-1}\t7\tsupport\tRGB(255,0,0)\t1.5\t-2\t0\txyz\t3\t0\t0\t1000\t0\t0\t0\t2.5";
        let node = NodeConverter.parse(&GwaRecord::parse(line).unwrap()).unwrap();
        assert_eq!(node.header.handle, Handle(7));
        assert_eq!(node.header.application_id.as_deref(), Some("pt-1"));
        assert_eq!(node.position, Vec3::new(1.5, -2.0, 0.0));
        assert_eq!(node.restraint.to_array(), [true, true, true, false, false, false]);
        assert_eq!(node.axis, NodeAxis::Ref(Handle(3)));
        assert_eq!(node.stiffness.z, 1000.0);
        assert_eq!(node.mass, 2.5);

        let again = NodeConverter.parse(&NodeConverter.serialize(&node)).unwrap();
        assert_eq!(again, node);
    }

    #[test]
    fn trailing_fields_are_optional() {
        let node = NodeConverter
            .parse(&GwaRecord::parse("NODE.3\t2\t\"\"\tNO_RGB\t0\t0\t4").unwrap())
            .unwrap();
        assert_eq!(node.axis, NodeAxis::Global);
        assert!(!node.restraint.any());
        assert_eq!(node.position.z, 4.0);
    }

    #[test]
    fn bad_coordinates_are_malformed() {
        let record = GwaRecord::parse("SET\tNODE.3\t2\tn\tNO_RGB\t0\tabc\t0").unwrap();
        assert!(matches!(
            NodeConverter.parse(&record),
            Err(RecordError::FieldType { index: 4, .. })
        ));
    }
}
