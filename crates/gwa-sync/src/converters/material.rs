use gwa_model::{EntityKind, Material, MaterialCategory};
use gwa_record::{GwaRecord, RecordError};

use super::{Converter, read_header, record_handle, set_record, split_keyword};
use crate::context::{ReadContext, WriteContext};
use crate::error::Result;

const STEEL: &str = "MAT_STEEL.3";
const CONCRETE: &str = "MAT_CONCRETE.17";
const GENERIC: &str = "MAT_ANAL.1";

/// `MAT_*   handle, name, grade, E, nu, rho, alpha`
pub struct MaterialConverter;

impl MaterialConverter {
    fn keyword_for(category: MaterialCategory) -> &'static str {
        match category {
            MaterialCategory::Steel => STEEL,
            MaterialCategory::Concrete => CONCRETE,
            MaterialCategory::Generic => GENERIC,
        }
    }

    fn category_for(keyword: &str) -> Option<MaterialCategory> {
        [STEEL, CONCRETE, GENERIC]
            .into_iter()
            .find(|k| split_keyword(k).0.eq_ignore_ascii_case(keyword))
            .map(|k| match k {
                STEEL => MaterialCategory::Steel,
                CONCRETE => MaterialCategory::Concrete,
                _ => MaterialCategory::Generic,
            })
    }

    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<Material, RecordError> {
        let category = Self::category_for(&record.keyword)
            .ok_or_else(|| record.unknown_token(&record.keyword))?;
        record.expect_len(7)?;
        Ok(Material {
            header: read_header(record, None)?,
            category,
            grade: record.text(2)?,
            elastic_modulus: record.float(3)?,
            poissons_ratio: record.float(4)?,
            density: record.float(5)?,
            thermal_expansion: record.float(6)?,
        })
    }

    pub fn serialize(&self, material: &Material) -> GwaRecord {
        let mut record = set_record(Self::keyword_for(material.category), &material.header);
        record
            .push(material.header.handle)
            .push_text(&material.header.name)
            .push_text(&material.grade)
            .push(material.elastic_modulus)
            .push(material.poissons_ratio)
            .push(material.density)
            .push(material.thermal_expansion);
        record
    }
}

impl Converter for MaterialConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Material
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[STEEL, CONCRETE, GENERIC]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in records {
            match self.parse(record) {
                Ok(material) => ctx.model.materials.push(material),
                Err(err) => ctx
                    .diagnostics
                    .malformed(Some(self.kind()), record_handle(record), &err),
            }
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut materials = std::mem::take(&mut ctx.model.materials);
        for material in &mut materials {
            ctx.allocator.assign(material.handle_space(), &mut material.header)?;
            ctx.emit(self.kind(), self.serialize(material));
        }
        ctx.model.materials = materials;
        Ok(())
    }
}
