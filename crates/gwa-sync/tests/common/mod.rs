#![allow(dead_code)]

use gwa_model::{
    AxisMode2D, BeamLoad, Dof6, Element0D, Element1D, Element2D, ElementCategory, EntityHeader,
    FaceLoad, Handle, LoadAxis, LoadCase, LoadCaseType, Material, MaterialCategory, Member1D,
    Member2D, MemberCategory, Model, Node, NodeLoad, Property1D, Property2D, Property2DType,
    PropertyMass, Ref, SectionProfile, Vec3,
};

pub fn r(handle: u32) -> Ref {
    Ref::from(Handle(handle))
}

/// A small frame with one of everything, all handles preset.
pub fn sample_model() -> Model {
    let mut model = Model::new();

    let mut steel = Material::new(1, MaterialCategory::Steel, "S355");
    steel.elastic_modulus = 2.1e11;
    steel.poissons_ratio = 0.3;
    steel.density = 7850.0;
    steel.thermal_expansion = 1.2e-5;
    model.materials.push(steel);

    model.sections.push(Property1D {
        header: EntityHeader::new(1, "RHS"),
        material_category: MaterialCategory::Steel,
        material: r(1),
        profile: SectionProfile::Rectangle {
            depth: 0.3,
            width: 0.2,
        },
    });
    model.properties_2d.push(Property2D {
        header: EntityHeader::new(1, "slab"),
        material_category: MaterialCategory::Steel,
        material: r(1),
        thickness: 0.2,
        axis_mode: AxisMode2D::Local,
        kind: Property2DType::Shell,
    });
    model.mass_properties.push(PropertyMass {
        header: EntityHeader::new(1, "lump"),
        mass: 10.0,
    });

    let mut support = Node::new(1, 0.0, 0.0, 0.0);
    support.restraint = Dof6::splat(true);
    model.nodes.push(support);
    model.nodes.push(Node::new(2, 10.0, 0.0, 0.0));
    model.nodes.push(Node::new(3, 10.0, 10.0, 0.0));
    model.nodes.push(Node::new(4, 0.0, 10.0, 0.0));

    model.elements_0d.push(Element0D {
        header: EntityHeader::new(1, "mass"),
        property: r(1),
        group: 0,
        connectivity: vec![Handle(4)],
        coordinates: Vec::new(),
    });
    model
        .elements_1d
        .push(Element1D::new(2, ElementCategory::Beam, r(1), [1, 2]));
    model.elements_2d.push(Element2D::new(3, r(1), &[1, 2, 3]));

    model
        .members_1d
        .push(Member1D::new(1, MemberCategory::Beam, r(1), &[2, 3]));
    model
        .members_2d
        .push(Member2D::new(2, MemberCategory::Slab, r(1), &[1, 2, 3, 4]));

    model
        .load_cases
        .push(LoadCase::new(1, "dead", LoadCaseType::Dead));
    model.node_loads.push(NodeLoad {
        header: EntityHeader::new(1, "point"),
        targets: vec![r(3)],
        case: r(1),
        axis: LoadAxis::Global,
        vector: Dof6::from_array([0.0, 0.0, -10.0, 0.0, 0.0, 0.0]),
    });
    model.beam_loads.push(BeamLoad {
        header: EntityHeader::new(1, "udl"),
        targets: vec![r(2)],
        case: r(1),
        axis: LoadAxis::Local,
        vector: Dof6::from_array([0.0, 0.0, -2.0, 0.0, 0.0, 0.0]),
    });
    model.face_loads.push(FaceLoad {
        header: EntityHeader::new(1, "pressure"),
        targets: vec![r(3)],
        case: r(1),
        axis: LoadAxis::Global,
        projected: false,
        pressure: Vec3::new(0.0, 0.0, -1.5),
    });

    model
}
