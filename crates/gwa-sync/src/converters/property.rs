use gwa_model::{
    AxisMode2D, EntityHeader, EntityKind, HandleSpace, MaterialCategory, Property1D, Property2D,
    Property2DType, PropertyMass, Ref, SectionProfile,
};
use gwa_record::{GwaRecord, RecordError, unquote};

use super::{Converter, read_header, record_handle, set_record};
use crate::context::{ReadContext, WriteContext};
use crate::error::Result;

/// Parses a section description such as `STD I 300 150 7.1 10.7` or
/// `GEO P M(-50|-50) L(50|-50) L(50|50) L(-50|50)`.
///
/// A unit suffix on the shape token (`STD R(mm) ...`) is ignored.
pub fn parse_profile(description: &str) -> Option<SectionProfile> {
    let mut tokens = unquote(description).split_whitespace();
    match tokens.next()?.to_ascii_uppercase().as_str() {
        "STD" => {
            let shape = tokens.next()?.to_ascii_uppercase();
            let shape = shape.split('(').next()?.to_string();
            let values = tokens
                .map(|t| t.parse::<f64>().ok())
                .collect::<Option<Vec<f64>>>()?;
            standard_profile(&shape, &values)
        }
        "GEO" => {
            if !tokens.next()?.eq_ignore_ascii_case("P") {
                return None;
            }
            let mut points = Vec::new();
            for token in tokens {
                let body = token
                    .strip_prefix(['M', 'L', 'm', 'l'])?
                    .strip_prefix('(')?
                    .strip_suffix(')')?;
                let (y, z) = body.split_once('|')?;
                points.push([y.trim().parse().ok()?, z.trim().parse().ok()?]);
            }
            (points.len() >= 3).then_some(SectionProfile::Perimeter(points))
        }
        _ => None,
    }
}

fn standard_profile(shape: &str, v: &[f64]) -> Option<SectionProfile> {
    let need = |n: usize| (v.len() == n).then_some(());
    Some(match shape {
        "R" => {
            need(2)?;
            SectionProfile::Rectangle { depth: v[0], width: v[1] }
        }
        "C" => {
            need(1)?;
            SectionProfile::Circle { diameter: v[0] }
        }
        "CHS" => {
            need(2)?;
            SectionProfile::CircularHollow { diameter: v[0], thickness: v[1] }
        }
        "I" | "T" | "CH" | "A" => {
            need(4)?;
            let (depth, width, web, flange) = (v[0], v[1], v[2], v[3]);
            match shape {
                "I" => SectionProfile::ISection { depth, width, web, flange },
                "T" => SectionProfile::Tee { depth, width, web, flange },
                "CH" => SectionProfile::Channel { depth, width, web, flange },
                _ => SectionProfile::Angle { depth, width, web, flange },
            }
        }
        "TR" => {
            need(3)?;
            SectionProfile::Taper { depth: v[0], top_width: v[1], bottom_width: v[2] }
        }
        "E" => {
            need(2)?;
            SectionProfile::Ellipse { depth: v[0], width: v[1] }
        }
        _ => return None,
    })
}

pub fn format_profile(profile: &SectionProfile) -> String {
    let standard = |shape: &str, values: &[f64]| {
        let values: Vec<String> = values.iter().map(f64::to_string).collect();
        format!("STD {shape} {}", values.join(" "))
    };
    match profile {
        SectionProfile::Rectangle { depth, width } => standard("R", &[*depth, *width]),
        SectionProfile::Circle { diameter } => standard("C", &[*diameter]),
        SectionProfile::CircularHollow { diameter, thickness } => standard("CHS", &[*diameter, *thickness]),
        SectionProfile::ISection { depth, width, web, flange } => {
            standard("I", &[*depth, *width, *web, *flange])
        }
        SectionProfile::Tee { depth, width, web, flange } => standard("T", &[*depth, *width, *web, *flange]),
        SectionProfile::Channel { depth, width, web, flange } => {
            standard("CH", &[*depth, *width, *web, *flange])
        }
        SectionProfile::Angle { depth, width, web, flange } => {
            standard("A", &[*depth, *width, *web, *flange])
        }
        SectionProfile::Taper { depth, top_width, bottom_width } => {
            standard("TR", &[*depth, *top_width, *bottom_width])
        }
        SectionProfile::Ellipse { depth, width } => standard("E", &[*depth, *width]),
        SectionProfile::Perimeter(points) => {
            let mut out = String::from("GEO P");
            for (i, [y, z]) in points.iter().enumerate() {
                let op = if i == 0 { 'M' } else { 'L' };
                out.push_str(&format!(" {op}({y}|{z})"));
            }
            out
        }
    }
}

fn material_category(record: &GwaRecord, index: usize) -> std::result::Result<MaterialCategory, RecordError> {
    let token = record.field(index)?;
    MaterialCategory::from_token(token).ok_or_else(|| record.unknown_token(token))
}

/// Checks that the referenced material exists in its category, reporting it
/// otherwise.
fn check_material(
    ctx: &mut ReadContext,
    kind: EntityKind,
    header: &EntityHeader,
    category: MaterialCategory,
    material: &Ref,
) {
    let Some(handle) = material.handle() else {
        return;
    };
    let found = ctx
        .model
        .materials
        .iter()
        .any(|m| m.category == category && m.header.handle == handle);
    if !found {
        ctx.diagnostics.unresolved(
            kind,
            header.handle,
            format!("{} material {handle} not found", category.token().to_ascii_lowercase()),
        );
    }
}

const PROP_SEC: &str = "PROP_SEC.3";

/// `PROP_SEC   handle, name, color, material-category, material, description`
pub struct Property1DConverter;

impl Property1DConverter {
    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<Property1D, RecordError> {
        record.expect_len(6)?;
        let description = record.field(5)?;
        let profile = parse_profile(description).ok_or_else(|| record.unknown_token(description))?;
        Ok(Property1D {
            header: read_header(record, Some(2))?,
            material_category: material_category(record, 3)?,
            material: Ref::Handle(record.handle(4)?),
            profile,
        })
    }

    pub fn serialize(&self, property: &Property1D) -> GwaRecord {
        let mut record = set_record(PROP_SEC, &property.header);
        record
            .push(property.header.handle)
            .push_text(&property.header.name)
            .push_color(property.header.color)
            .push(property.material_category.token())
            .push(property.material.handle().unwrap_or_default())
            .push(format_profile(&property.profile));
        record
    }
}

impl Converter for Property1DConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Property1D
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[PROP_SEC]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in records {
            match self.parse(record) {
                Ok(property) => {
                    check_material(
                        ctx,
                        self.kind(),
                        &property.header,
                        property.material_category,
                        &property.material,
                    );
                    ctx.model.sections.push(property);
                }
                Err(err) => ctx
                    .diagnostics
                    .malformed(Some(self.kind()), record_handle(record), &err),
            }
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut sections = std::mem::take(&mut ctx.model.sections);
        for property in &mut sections {
            let handle = ctx.allocator.assign(HandleSpace::Property1D, &mut property.header)?;
            let material = ctx.resolve(
                self.kind(),
                handle,
                HandleSpace::Material(property.material_category),
                &property.material,
            )?;
            property.material = Ref::Handle(material);
            ctx.emit(self.kind(), self.serialize(property));
        }
        ctx.model.sections = sections;
        Ok(())
    }
}

const PROP_2D: &str = "PROP_2D.7";

/// `PROP_2D   handle, name, color, axis, material-category, material, type,
/// thickness`
pub struct Property2DConverter;

impl Property2DConverter {
    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<Property2D, RecordError> {
        record.expect_len(8)?;
        let axis_token = record.field(3)?;
        let axis_mode = match axis_token.to_ascii_uppercase().as_str() {
            "GLOBAL" => AxisMode2D::GlobalProjected,
            "LOCAL" => AxisMode2D::Local,
            _ => return Err(record.unknown_token(axis_token)),
        };
        let type_token = record.field(6)?;
        Ok(Property2D {
            header: read_header(record, Some(2))?,
            material_category: material_category(record, 4)?,
            material: Ref::Handle(record.handle(5)?),
            thickness: record.float(7)?,
            axis_mode,
            kind: Property2DType::from_token(type_token)
                .ok_or_else(|| record.unknown_token(type_token))?,
        })
    }

    pub fn serialize(&self, property: &Property2D) -> GwaRecord {
        let axis = match property.axis_mode {
            AxisMode2D::GlobalProjected => "GLOBAL",
            AxisMode2D::Local => "LOCAL",
        };
        let mut record = set_record(PROP_2D, &property.header);
        record
            .push(property.header.handle)
            .push_text(&property.header.name)
            .push_color(property.header.color)
            .push(axis)
            .push(property.material_category.token())
            .push(property.material.handle().unwrap_or_default())
            .push(property.kind.token())
            .push(property.thickness);
        record
    }
}

impl Converter for Property2DConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Property2D
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[PROP_2D]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in records {
            match self.parse(record) {
                Ok(property) => {
                    check_material(
                        ctx,
                        self.kind(),
                        &property.header,
                        property.material_category,
                        &property.material,
                    );
                    ctx.model.properties_2d.push(property);
                }
                Err(err) => ctx
                    .diagnostics
                    .malformed(Some(self.kind()), record_handle(record), &err),
            }
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut properties = std::mem::take(&mut ctx.model.properties_2d);
        for property in &mut properties {
            let handle = ctx.allocator.assign(HandleSpace::Property2D, &mut property.header)?;
            let material = ctx.resolve(
                self.kind(),
                handle,
                HandleSpace::Material(property.material_category),
                &property.material,
            )?;
            property.material = Ref::Handle(material);
            ctx.emit(self.kind(), self.serialize(property));
        }
        ctx.model.properties_2d = properties;
        Ok(())
    }
}

const PROP_MASS: &str = "PROP_MASS.3";

/// `PROP_MASS   handle, name, mass`
pub struct PropertyMassConverter;

impl PropertyMassConverter {
    pub fn parse(&self, record: &GwaRecord) -> std::result::Result<PropertyMass, RecordError> {
        record.expect_len(3)?;
        Ok(PropertyMass {
            header: read_header(record, None)?,
            mass: record.float(2)?,
        })
    }

    pub fn serialize(&self, property: &PropertyMass) -> GwaRecord {
        let mut record = set_record(PROP_MASS, &property.header);
        record
            .push(property.header.handle)
            .push_text(&property.header.name)
            .push(property.mass);
        record
    }
}

impl Converter for PropertyMassConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::PropertyMass
    }

    fn keywords(&self) -> &'static [&'static str] {
        &[PROP_MASS]
    }

    fn read(&self, records: &[&GwaRecord], ctx: &mut ReadContext) {
        for record in records {
            match self.parse(record) {
                Ok(property) => ctx.model.mass_properties.push(property),
                Err(err) => ctx
                    .diagnostics
                    .malformed(Some(self.kind()), record_handle(record), &err),
            }
        }
    }

    fn write(&self, ctx: &mut WriteContext) -> Result<()> {
        let mut properties = std::mem::take(&mut ctx.model.mass_properties);
        for property in &mut properties {
            ctx.allocator.assign(HandleSpace::PropertyMass, &mut property.header)?;
            ctx.emit(self.kind(), self.serialize(property));
        }
        ctx.model.mass_properties = properties;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gwa_model::Color;

    #[test]
    fn standard_descriptions() {
        assert_eq!(
            parse_profile("STD I 300 150 7.1 10.7"),
            Some(SectionProfile::ISection { depth: 300.0, width: 150.0, web: 7.1, flange: 10.7 })
        );
        assert_eq!(
            parse_profile("STD R(mm) 400 200"),
            Some(SectionProfile::Rectangle { depth: 400.0, width: 200.0 })
        );
        assert_eq!(parse_profile("STD C 1 2"), None);
        assert_eq!(parse_profile("CAT UB 305x165x40"), None);
    }

    #[test]
    fn perimeter_description() {
        let text = "GEO P M(-50|-50) L(50|-50) L(50|50) L(-50|50)";
        let profile = parse_profile(text).unwrap();
        match &profile {
            SectionProfile::Perimeter(points) => {
                assert_eq!(points.len(), 4);
                assert_eq!(points[2], [50.0, 50.0]);
            }
            other => panic!("unexpected profile {other:?}"),
        }
        assert_eq!(format_profile(&profile), text);
    }

    #[test]
    fn section_record_roundtrip() {
        let property = Property1D {
            header: EntityHeader {
                color: Some(Color::rgb(0, 128, 255)),
                ..EntityHeader::new(4, "column, braced")
            },
            material_category: MaterialCategory::Steel,
            material: Ref::from(2),
            profile: SectionProfile::CircularHollow { diameter: 0.2191, thickness: 0.008 },
        };
        let record = Property1DConverter.serialize(&property);
        let line = record.encode();
        let parsed = Property1DConverter.parse(&GwaRecord::parse(&line).unwrap()).unwrap();
        assert_eq!(parsed, property);
    }

    #[test]
    fn plate_axis_modes() {
        let record =
            GwaRecord::parse("SET\tPROP_2D.7\t1\tslab\tNO_RGB\tGLOBAL\tCONCRETE\t1\tSHELL\t0.25").unwrap();
        let property = Property2DConverter.parse(&record).unwrap();
        assert_eq!(property.axis_mode, AxisMode2D::GlobalProjected);
        assert_eq!(property.thickness, 0.25);

        let bad = GwaRecord::parse("SET\tPROP_2D.7\t1\tslab\tNO_RGB\tSKEW\tCONCRETE\t1\tSHELL\t0.25").unwrap();
        assert!(matches!(
            Property2DConverter.parse(&bad),
            Err(RecordError::UnknownToken { .. })
        ));
    }
}
