//! One converter per entity kind.
//!
//! `parse`/`serialize` map between one record and one entity without any
//! cross-references resolved. `read`/`write` run a whole kind inside an
//! operation context: they resolve references against kinds that are already
//! done, assign handles, and report problems as diagnostics.

mod axis;
mod element;
mod load;
mod material;
mod member;
mod mesh;
mod node;
mod property;

use std::collections::{BTreeSet, HashMap};

use gwa_model::{EntityHeader, EntityKind, Handle};
use gwa_record::{APP_ID_TAG, GwaRecord, RecordError, Verb};

use crate::context::{ReadContext, WriteContext};
use crate::error::Result;

pub use axis::AxisConverter;
pub use element::{Element0DConverter, Element1DConverter, Element2DConverter};
pub use load::{LoadCaseConverter, LoadNodeConverter, Load1DConverter, Load2DConverter};
pub use material::MaterialConverter;
pub use member::{Member1DConverter, Member2DConverter};
pub use mesh::MeshConverter;
pub use node::NodeConverter;
pub use property::{
    Property1DConverter, Property2DConverter, PropertyMassConverter, format_profile, parse_profile,
};

pub trait Converter {
    fn kind(&self) -> EntityKind;

    /// Versioned keywords this kind is stored under, e.g. `NODE.3`.
    fn keywords(&self) -> &'static [&'static str];

    /// Parses the records of this kind into `ctx.model`.
    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext);

    /// Serializes every entity of this kind in `ctx.model`.
    fn write(&self, ctx: &mut WriteContext) -> Result<()>;
}

/// Converter registered for `kind`.
pub fn converter(kind: EntityKind) -> &'static dyn Converter {
    match kind {
        EntityKind::Material => &MaterialConverter,
        EntityKind::Property1D => &Property1DConverter,
        EntityKind::Property2D => &Property2DConverter,
        EntityKind::PropertyMass => &PropertyMassConverter,
        EntityKind::Axis => &AxisConverter,
        EntityKind::Node => &NodeConverter,
        EntityKind::Element0D => &Element0DConverter,
        EntityKind::Element1D => &Element1DConverter,
        EntityKind::Element2D => &Element2DConverter,
        EntityKind::Mesh => &MeshConverter,
        EntityKind::Member1D => &Member1DConverter,
        EntityKind::Member2D => &Member2DConverter,
        EntityKind::LoadCase => &LoadCaseConverter,
        EntityKind::LoadNode => &LoadNodeConverter,
        EntityKind::Load1D => &Load1DConverter,
        EntityKind::Load2D => &Load2DConverter,
    }
}

/// Splits `NODE.3` into `("NODE", Some(3))`.
pub fn split_keyword(keyword: &str) -> (&str, Option<u32>) {
    match keyword.split_once('.') {
        Some((name, version)) => (name, version.parse().ok()),
        None => (keyword, None),
    }
}

/// Empty `SET` record for `keyword` carrying the header's application id.
pub(crate) fn set_record(keyword: &str, header: &EntityHeader) -> GwaRecord {
    let (name, version) = split_keyword(keyword);
    let mut record = GwaRecord::new(name, version).with_verb(Verb::Set);
    record.set_tag(APP_ID_TAG, header.application_id.as_deref());
    record
}

/// Header from the usual leading `handle, name[, color]` fields.
pub(crate) fn read_header(
    record: &GwaRecord,
    color_at: Option<usize>,
) -> std::result::Result<EntityHeader, RecordError> {
    Ok(EntityHeader {
        handle: record.handle(0)?,
        name: record.text(1)?,
        color: match color_at {
            Some(index) => record.color(index)?,
            None => None,
        },
        application_id: record.application_id().map(str::to_string),
    })
}

/// Best-effort handle of a record for diagnostics.
pub(crate) fn record_handle(record: &GwaRecord) -> Handle {
    match record.verb {
        Verb::SetAt(index) => index,
        _ => record.handle(0).unwrap_or(Handle::UNSET),
    }
}

/// Handles of records in a space keyed by `SET_AT` index. A record without
/// an index takes its 1-based position among the records, unless an indexed
/// or earlier record already holds that handle; then it takes the next
/// handle above every one in use.
pub(crate) fn indexed_handles(records: &[&GwaRecord]) -> Vec<Handle> {
    let mut used: BTreeSet<Handle> = records
        .iter()
        .filter_map(|record| match record.verb {
            Verb::SetAt(index) => Some(index),
            _ => None,
        })
        .collect();
    let mut highest = used.iter().next_back().map_or(0, |h| h.0);
    records
        .iter()
        .enumerate()
        .map(|(position, record)| match record.verb {
            Verb::SetAt(index) => index,
            _ => {
                let positional = Handle(position as u32 + 1);
                let handle = if used.contains(&positional) {
                    Handle(highest + 1)
                } else {
                    positional
                };
                used.insert(handle);
                highest = highest.max(handle.0);
                handle
            }
        })
        .collect()
}

/// Records grouped by keyword, in arrival order.
#[derive(Debug, Default)]
pub struct RecordSet {
    by_keyword: HashMap<String, Vec<GwaRecord>>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: GwaRecord) {
        self.by_keyword
            .entry(record.keyword.to_ascii_uppercase())
            .or_default()
            .push(record);
    }

    /// Records stored under any of the (versioned) keywords.
    pub fn select(&self, keywords: &[&str]) -> Vec<&GwaRecord> {
        keywords
            .iter()
            .filter_map(|k| self.by_keyword.get(&split_keyword(k).0.to_ascii_uppercase()))
            .flatten()
            .collect()
    }

    pub fn keyword(&self, keyword: &str) -> &[GwaRecord] {
        self.by_keyword
            .get(&keyword.to_ascii_uppercase())
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_keyword.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<GwaRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = GwaRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.push(record);
        }
        set
    }
}
