//! Load cases and the loads applied under them.
//!
//! Load records have no handle field: their handle is the `SET_AT` index, or
//! the 1-based position among records of the keyword when read without one.

use gwa_model::{
    BeamLoad, Dof6, EntityHeader, EntityKind, FaceLoad, Handle, HandleSpace, LoadAxis, LoadCase,
    LoadCaseType, NodeLoad, Ref, Vec3,
};
use gwa_record::{GwaRecord, RecordError, Verb, format_handle_list};

use super::{Converter, indexed_handles, read_header, record_handle, set_record};
use crate::context::{ReadContext, WriteContext};
use crate::error::Result;

const LOAD_TITLE: &str = "LOAD_TITLE.2";
const LOAD_NODE: &str = "LOAD_NODE.3";
const LOAD_BEAM: &str = "LOAD_BEAM_UDL.3";
const LOAD_FACE: &str = "LOAD_2D_FACE.3";

/// `LOAD_TITLE   handle, name, type`
pub struct LoadCaseConverter;

impl LoadCaseConverter {
    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<LoadCase, RecordError> {
        record.expect_len(3)?;
        Ok(LoadCase {
            header: read_header(record, None)?,
            case_type: LoadCaseType::from_token(record.field(2)?),
        })
    }

    pub fn serialize(&self, case: &LoadCase) -> GwaRecord {
        let mut record = set_record(LOAD_TITLE, &case.header);
        record
            .push(case.header.handle)
            .push_text(&case.header.name)
            .push(case.case_type.token());
        record
    }
}

impl Converter for LoadCaseConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::LoadCase
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[LOAD_TITLE]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in records {
            match self.parse(record) {
                Ok(case) => ctx.model.load_cases.push(case),
                Err(err) => ctx
                    .diagnostics
                    .malformed(Some(self.kind()), record_handle(record), &err),
            }
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut cases = std::mem::take(&mut ctx.model.load_cases);
        for case in &mut cases {
            ctx.allocator.assign(HandleSpace::LoadCase, &mut case.header)?;
            ctx.emit(self.kind(), self.serialize(case));
        }
        ctx.model.load_cases = cases;
        Ok(())
    }
}

/// Leading `name, list, case, axis` fields shared by every load record.
struct LoadHead {
    header: EntityHeader,
    targets: Vec<Ref>,
    case: Ref,
    axis: LoadAxis,
}

impl LoadHead {
    /// `handle` is used unless the record carries a `SET_AT` index.
    fn parse(
        record: &GwaRecord,
        handle: Handle,
        ctx: &ReadContext,
    ) -> std::result::Result<Self, RecordError> {
        record.expect_len(4)?;
        let axis = record.field(3)?;
        Ok(Self {
            header: EntityHeader {
                handle: match record.verb {
                    Verb::SetAt(index) => index,
                    _ => handle,
                },
                name: record.text(0)?,
                color: None,
                application_id: record.application_id().map(str::to_string),
            },
            targets: ctx
                .parse_targets(record.field(1)?)?
                .into_iter()
                .map(Ref::Handle)
                .collect(),
            case: Ref::Handle(record.handle(2)?),
            axis: LoadAxis::from_token(axis).ok_or_else(|| record.unknown_token(axis))?,
        })
    }

    /// `SET_AT` record carrying the head fields of an already resolved load.
    fn encode(keyword: &str, header: &EntityHeader, targets: &[Handle], case: Handle, axis: LoadAxis) -> GwaRecord {
        let mut record = set_record(keyword, header).with_verb(Verb::SetAt(header.handle));
        record
            .push_text(&header.name)
            .push(format_handle_list(targets))
            .push(case)
            .push(axis.token());
        record
    }
}

fn vector(record: &GwaRecord, from: usize) -> std::result::Result<Dof6<f64>, RecordError> {
    record.expect_len(from + 6)?;
    let mut values = [0.0; 6];
    for (i, v) in values.iter_mut().enumerate() {
        *v = record.float(from + i)?;
    }
    Ok(Dof6::from_array(values))
}

fn check_case(ctx: &mut ReadContext, kind: EntityKind, owner: Handle, case: &Ref) {
    let found = case
        .handle()
        .is_some_and(|h| ctx.model.load_cases.iter().any(|c| c.header.handle == h));
    if !found {
        ctx.diagnostics
            .unresolved(kind, owner, format!("load case {case:?} not found"));
    }
}

/// Resolves the targets and case of a load being written, then assigns its
/// handle. `None` when the load has no target or no load case left, after a
/// diagnostic.
fn resolve_head(
    ctx: &mut WriteContext,
    kind: EntityKind,
    space: HandleSpace,
    header: &mut EntityHeader,
    target_space: HandleSpace,
    targets: &mut Vec<Ref>,
    case: &mut Ref,
) -> Result<Option<(Vec<Handle>, Handle)>> {
    let owner = header.handle;
    let mut resolved = ctx.resolve_all(kind, owner, target_space, targets)?;
    resolved.retain(|h| h.is_set());
    if resolved.is_empty() {
        ctx.diagnostics
            .unresolved(kind, owner, "load has no resolvable targets; skipped");
        return Ok(None);
    }
    let case_handle = ctx.resolve(kind, owner, HandleSpace::LoadCase, case)?;
    let case_exists = ctx
        .model
        .load_cases
        .iter()
        .any(|c| case_handle.is_set() && c.header.handle == case_handle);
    if !case_exists {
        ctx.diagnostics
            .unresolved(kind, owner, format!("load case {case:?} not found; skipped"));
        return Ok(None);
    }

    ctx.allocator.assign(space, header)?;
    *targets = resolved.iter().copied().map(Ref::Handle).collect();
    *case = Ref::Handle(case_handle);
    Ok(Some((resolved, case_handle)))
}

/// `LOAD_NODE   name, list, case, axis, fx, fy, fz, mx, my, mz`
pub struct LoadNodeConverter;

impl LoadNodeConverter {
    pub fn parse(
        &self,
        record: &GwaRecord,
        handle: Handle,
        ctx: &ReadContext,
    ) -> std::result::Result<NodeLoad, RecordError> {
        let head = LoadHead::parse(record, handle, ctx)?;
        Ok(NodeLoad {
            header: head.header,
            targets: head.targets,
            case: head.case,
            axis: head.axis,
            vector: vector(record, 4)?,
        })
    }

    pub fn serialize(&self, load: &NodeLoad, targets: &[Handle], case: Handle) -> GwaRecord {
        let mut record = LoadHead::encode(LOAD_NODE, &load.header, targets, case, load.axis);
        for v in load.vector.to_array() {
            record.push(v);
        }
        record
    }
}

impl Converter for LoadNodeConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::LoadNode
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[LOAD_NODE]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for (record, handle) in records.iter().zip(indexed_handles(records)) {
            match self.parse(record, handle, ctx) {
                Ok(load) => {
                    check_case(ctx, self.kind(), load.header.handle, &load.case);
                    ctx.model.node_loads.push(load);
                }
                Err(err) => ctx.diagnostics.malformed(Some(self.kind()), handle, &err),
            }
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut loads = std::mem::take(&mut ctx.model.node_loads);
        for load in &mut loads {
            let head = resolve_head(
                ctx,
                self.kind(),
                HandleSpace::LoadNode,
                &mut load.header,
                HandleSpace::Node,
                &mut load.targets,
                &mut load.case,
            )?;
            if let Some((targets, case)) = head {
                ctx.emit(self.kind(), self.serialize(load, &targets, case));
            }
        }
        ctx.model.node_loads = loads;
        Ok(())
    }
}

/// `LOAD_BEAM_UDL   name, list, case, axis, wx, wy, wz, wxx, wyy, wzz`
pub struct Load1DConverter;

impl Load1DConverter {
    pub fn parse(
        &self,
        record: &GwaRecord,
        handle: Handle,
        ctx: &ReadContext,
    ) -> std::result::Result<BeamLoad, RecordError> {
        let head = LoadHead::parse(record, handle, ctx)?;
        Ok(BeamLoad {
            header: head.header,
            targets: head.targets,
            case: head.case,
            axis: head.axis,
            vector: vector(record, 4)?,
        })
    }

    pub fn serialize(&self, load: &BeamLoad, targets: &[Handle], case: Handle) -> GwaRecord {
        let mut record = LoadHead::encode(LOAD_BEAM, &load.header, targets, case, load.axis);
        for v in load.vector.to_array() {
            record.push(v);
        }
        record
    }
}

impl Converter for Load1DConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Load1D
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[LOAD_BEAM]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for (record, handle) in records.iter().zip(indexed_handles(records)) {
            match self.parse(record, handle, ctx) {
                Ok(load) => {
                    check_case(ctx, self.kind(), load.header.handle, &load.case);
                    ctx.model.beam_loads.push(load);
                }
                Err(err) => ctx.diagnostics.malformed(Some(self.kind()), handle, &err),
            }
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut loads = std::mem::take(&mut ctx.model.beam_loads);
        for load in &mut loads {
            let head = resolve_head(
                ctx,
                self.kind(),
                HandleSpace::Load1D,
                &mut load.header,
                HandleSpace::Element,
                &mut load.targets,
                &mut load.case,
            )?;
            if let Some((targets, case)) = head {
                ctx.emit(self.kind(), self.serialize(load, &targets, case));
            }
        }
        ctx.model.beam_loads = loads;
        Ok(())
    }
}

/// `LOAD_2D_FACE   name, list, case, axis, projected, px, py, pz`
///
/// Targets given by a mesh's application id expand to all of its faces.
pub struct Load2DConverter;

impl Load2DConverter {
    pub fn parse(
        &self,
        record: &GwaRecord,
        handle: Handle,
        ctx: &ReadContext,
    ) -> std::result::Result<FaceLoad, RecordError> {
        let head = LoadHead::parse(record, handle, ctx)?;
        record.expect_len(8)?;
        let projected = record.field(4)?;
        let projected = match projected.to_ascii_uppercase().as_str() {
            "YES" => true,
            "NO" => false,
            _ => return Err(record.unknown_token(projected)),
        };
        Ok(FaceLoad {
            header: head.header,
            targets: head.targets,
            case: head.case,
            axis: head.axis,
            projected,
            pressure: Vec3::new(record.float(5)?, record.float(6)?, record.float(7)?),
        })
    }

    pub fn serialize(&self, load: &FaceLoad, targets: &[Handle], case: Handle) -> GwaRecord {
        let mut record = LoadHead::encode(LOAD_FACE, &load.header, targets, case, load.axis);
        record
            .push(if load.projected { "YES" } else { "NO" })
            .push(load.pressure.x)
            .push(load.pressure.y)
            .push(load.pressure.z);
        record
    }
}

impl Converter for Load2DConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Load2D
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[LOAD_FACE]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for (record, handle) in records.iter().zip(indexed_handles(records)) {
            match self.parse(record, handle, ctx) {
                Ok(load) => {
                    check_case(ctx, self.kind(), load.header.handle, &load.case);
                    ctx.model.face_loads.push(load);
                }
                Err(err) => ctx.diagnostics.malformed(Some(self.kind()), handle, &err),
            }
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut loads = std::mem::take(&mut ctx.model.face_loads);
        for load in &mut loads {
            let head = resolve_head(
                ctx,
                self.kind(),
                HandleSpace::Load2D,
                &mut load.header,
                HandleSpace::Element,
                &mut load.targets,
                &mut load.case,
            )?;
            if let Some((targets, case)) = head {
                ctx.emit(self.kind(), self.serialize(load, &targets, case));
            }
        }
        ctx.model.face_loads = loads;
        Ok(())
    }
}
