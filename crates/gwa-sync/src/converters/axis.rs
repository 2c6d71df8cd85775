use gwa_model::{Axis, AxisDefinition, EntityKind, HandleSpace, Vec3};
use gwa_record::{GwaRecord, RecordError};

use super::{Converter, read_header, record_handle, set_record};
use crate::context::{ReadContext, WriteContext};
use crate::error::Result;

const AXIS: &str = "AXIS.1";

/// `AXIS   handle, name, CART, ox, oy, oz, xx, xy, xz, yx, yy, yz`
///
/// Only the x and xy-plane directions are stored; z follows from them.
pub struct AxisConverter;

impl AxisConverter {
    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<AxisDefinition, RecordError> {
        record.expect_len(12)?;
        let kind = record.field(2)?;
        if !kind.eq_ignore_ascii_case("CART") {
            return Err(record.unknown_token(kind));
        }
        let v = |at: usize| -> std::result::Result<Vec3, RecordError> {
            Ok(Vec3::new(record.float(at)?, record.float(at + 1)?, record.float(at + 2)?))
        };
        Ok(AxisDefinition {
            header: read_header(record, None)?,
            axis: Axis::from_xy_plane(v(3)?, v(6)?, v(9)?),
        })
    }

    pub fn serialize(&self, definition: &AxisDefinition) -> GwaRecord {
        let mut record = set_record(AXIS, &definition.header);
        record
            .push(definition.header.handle)
            .push_text(&definition.header.name)
            .push("CART");
        let axis = &definition.axis;
        for v in [axis.origin, axis.x, axis.y] {
            record.push(v.x).push(v.y).push(v.z);
        }
        record
    }
}

impl Converter for AxisConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Axis
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[AXIS]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in records {
            match self.parse(record) {
                Ok(axis) => ctx.model.axes.push(axis),
                Err(err) => ctx
                    .diagnostics
                    .malformed(Some(self.kind()), record_handle(record), &err),
            }
        }
    }

    /// Axes synthesized by the node pass already carry their handle.
    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let explicit = ctx.explicit_axes();
        let mut axes = std::mem::take(&mut ctx.model.axes);
        for (i, definition) in axes.iter_mut().enumerate() {
            if i < explicit {
                ctx.allocator.assign(HandleSpace::Axis, &mut definition.header)?;
            }
            ctx.emit(self.kind(), self.serialize(definition));
        }
        ctx.model.axes = axes;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_record_rebuilds_the_triad() {
        let record = GwaRecord::parse(
            "SET\tAXIS.1\t3\tskew\tCART\t1\t2\t0\t0\t1\t0\t-1\t0\t0",
        )
        .unwrap();
        let definition = AxisConverter.parse(&record).unwrap();
        assert_eq!(definition.axis.origin, Vec3::new(1.0, 2.0, 0.0));
        assert!((definition.axis.z - Vec3::z()).norm() < 1e-12);

        let again = AxisConverter.parse(&AxisConverter.serialize(&definition)).unwrap();
        assert!(again.axis.same_directions(&definition.axis, 1e-12));
        assert_eq!(again.header, definition.header);
    }

    #[test]
    fn polar_axes_are_rejected() {
        let record = GwaRecord::parse("SET\tAXIS.1\t3\tp\tCYL\t0\t0\t0\t1\t0\t0\t0\t1\t0").unwrap();
        assert!(AxisConverter.parse(&record).is_err());
    }
}
