mod common;

use common::r;
use gwa_model::axis::axis_1d;
use gwa_model::{Element1D, EntityKind, Handle, HandleSpace, Model, Node, Vec3};
use gwa_record::GwaRecord;
use gwa_sync::{
    DiagnosticKind, Direction, Engine, KindState, Progress, Schedule, Seed, SyncConfig, SyncError,
    registrations,
};

fn engine() -> Engine {
    Engine::new(SyncConfig::default()).unwrap()
}

fn close(a: Vec3, b: Vec3) -> bool {
    (a - b).norm() < 1e-9
}

#[test]
fn horizontal_beam_gets_the_standard_axis() {
    let outcome = engine()
        .read(&[
            "SET\tMAT_STEEL.3\t1\tS355\tS355\t2.1e11\t0.3\t7850\t1.2e-5",
            "SET\tPROP_SEC.3\t1\tsec\tNO_RGB\tSTEEL\t1\tSTD R 0.3 0.2",
            "SET\tNODE.3\t1\ta\tNO_RGB\t0\t0\t0",
            "SET\tNODE.3\t2\tb\tNO_RGB\t10\t0\t0",
            "SET\tEL.4\t1\tbeam\tNO_RGB\tBEAM\t1\t0\t1\t2\t0\t0\tNO_RLS",
        ])
        .unwrap();
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);

    let axis = outcome.model.elements_1d[0].local_axis.unwrap();
    assert!(close(axis.x, Vec3::x()));
    assert!(close(axis.y, Vec3::y()));
    assert!(close(axis.z, Vec3::z()));
}

#[test]
fn beam_rotation_is_recovered_from_its_axis() {
    let start = Vec3::zeros();
    let end = Vec3::new(10.0, 0.0, 0.0);
    let mut beam = Element1D::between(start, end, r(1));
    beam.local_axis = Some(axis_1d(&start, &end, 90.0));

    let mut model = Model::new();
    model.elements_1d.push(beam);
    let written = engine().write(model, &[]).unwrap();

    let el = written.records.iter().find(|r| r.keyword == "EL").unwrap();
    assert_eq!(el.fields[6..8], ["1".to_string(), "2".to_string()]);
    assert!((el.float(9).unwrap() - 90.0).abs() < 1e-9);
    assert_eq!(written.model.nodes.len(), 2);
}

#[test]
fn fan_of_triangles_becomes_one_mesh() {
    let outcome = engine()
        .read(&[
            "SET\tNODE.3\t1\tc\tNO_RGB\t0\t0\t0",
            "SET\tNODE.3\t2\ta\tNO_RGB\t1\t0\t0",
            "SET\tNODE.3\t3\tb\tNO_RGB\t-0.5\t1\t0",
            "SET\tNODE.3\t4\td\tNO_RGB\t-0.5\t-1\t0",
            "SET\tEL.4\t1\t\"\"\tNO_RGB\tTRI3\t1\t0\t1\t2\t3\t0\t0\tNO_RLS",
            "SET\tEL.4\t2\t\"\"\tNO_RGB\tTRI3\t1\t0\t1\t3\t4\t0\t0\tNO_RLS",
            "SET\tEL.4\t3\t\"\"\tNO_RGB\tTRI3\t1\t0\t1\t4\t2\t0\t0\tNO_RLS",
            "SET\tEL.4\t4\t\"\"\tNO_RGB\tTRI3\t2\t0\t2\t3\t4\t0\t0\tNO_RLS",
        ])
        .unwrap();
    let model = outcome.model;
    assert!(model.elements_2d.is_empty());
    assert_eq!(model.meshes.len(), 2);

    let fan = &model.meshes[0];
    assert_eq!(fan.faces.len(), 3);
    assert_eq!(fan.vertices.len(), 4);
    assert_eq!(fan.boundary_edges().len(), 3);
    assert_eq!(model.meshes[1].element_handles(), vec![Handle(4)]);
}

#[test]
fn new_handles_go_above_the_highest_seed() {
    let mut model = Model::new();
    model.nodes.push(Node::at(Vec3::new(1.0, 1.0, 1.0)));
    let seeds: Vec<Seed> = [1, 3, 5]
        .into_iter()
        .map(|h| Seed::new(HandleSpace::Node, h, None))
        .collect();

    let written = engine().write(model, &seeds).unwrap();
    assert_eq!(written.model.nodes[0].header.handle, Handle(6));
    assert_eq!(written.records[0].fields[0], "6");
}

#[test]
fn seeded_application_ids_keep_their_handles() {
    let mut node = Node::at(Vec3::zeros());
    node.header.application_id = Some("pt-9".into());
    let mut model = Model::new();
    model.nodes.push(node);
    let seeds = [Seed::new(HandleSpace::Node, 3, Some("pt-9")), Seed::new(HandleSpace::Node, 8, None)];

    let written = engine().write(model, &seeds).unwrap();
    assert_eq!(written.model.nodes[0].header.handle, Handle(3));
}

#[test]
fn element_ends_merge_into_nearby_nodes() {
    let mut model = Model::new();
    model.nodes.push(Node::new(1, 0.0, 0.0, 0.0));
    model.elements_1d.push(Element1D::between(
        Vec3::new(0.0, 0.0, 0.0005),
        Vec3::new(5.0, 0.0, 0.0),
        r(1),
    ));

    let written = engine().write(model, &[]).unwrap();
    let nodes: Vec<&GwaRecord> = written.records.iter().filter(|r| r.keyword == "NODE").collect();
    assert_eq!(nodes.len(), 2);
    assert_eq!(written.model.elements_1d[0].connectivity, vec![Handle(1), Handle(2)]);
    assert_eq!(written.model.nodes[1].position, Vec3::new(5.0, 0.0, 0.0));
}

#[test]
fn no_two_written_nodes_coincide() {
    let tolerance = SyncConfig::default().coincident_node_tolerance;
    let mut model = Model::new();
    model.nodes.push(Node::new(1, 0.0, 0.0, 0.0));
    model.nodes.push(Node::new(2, 0.0002, 0.0, 0.0));
    model.nodes.push(Node::new(3, 5.0, 0.0, 0.0));
    model
        .elements_1d
        .push(Element1D::new(5, gwa_model::ElementCategory::Beam, r(1), [2, 3]));
    model.elements_1d.push(Element1D::between(
        Vec3::new(0.0004, 0.0, 0.0),
        Vec3::new(5.0, 0.0, 0.0001),
        r(1),
    ));

    let written = engine().write(model, &[]).unwrap();
    let nodes = &written.model.nodes;
    assert_eq!(nodes.len(), 2);
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            assert!(a.distance_to(&b.position) > tolerance);
        }
    }
    for element in &written.model.elements_1d {
        assert_eq!(element.connectivity, vec![Handle(1), Handle(3)]);
    }
}

#[test]
fn a_second_write_adds_no_nodes() {
    let engine = Engine::new(SyncConfig {
        consolidate_meshes: false,
        ..SyncConfig::default()
    })
    .unwrap();
    let first = engine.write(common::sample_model(), &[]).unwrap();
    let read = engine.read(&first.commands()).unwrap();
    let seeds = Seed::from_model(&read.model);
    let second = engine.write(read.model, &seeds).unwrap();

    assert_eq!(second.records.len(), first.records.len());
    assert_eq!(second.model.nodes.len(), first.model.nodes.len());
    assert_eq!(
        second.model.handles(EntityKind::Node),
        first.model.handles(EntityKind::Node)
    );
}

#[test]
fn prerequisites_finish_before_dependents_start() {
    let schedule = Schedule::build(&registrations(), Direction::Write).unwrap();
    let mut progress = Progress::new(&schedule);
    assert!(matches!(
        progress.start(EntityKind::Node),
        Err(SyncError::PrerequisiteNotDone { kind: EntityKind::Node, .. })
    ));

    for &kind in schedule.order() {
        progress.start(kind).unwrap();
        assert_eq!(progress.state(kind), KindState::Running);
        progress.finish(kind);
    }
    assert!(progress.is_complete());
}

#[test]
fn cyclic_registrations_are_rejected() {
    let mut table = registrations();
    let material = table
        .iter_mut()
        .find(|r| r.kind == EntityKind::Material)
        .unwrap();
    material.read_prerequisites = vec![EntityKind::Property1D];

    let err = Engine::with_registrations(SyncConfig::default(), &table).unwrap_err();
    let SyncError::DependencyCycle(kinds) = err else {
        panic!("expected a dependency cycle");
    };
    assert!(kinds.contains(&EntityKind::Material));
    assert!(kinds.contains(&EntityKind::Property1D));
}

#[test]
fn a_handle_requested_twice_aborts_the_write() {
    let mut model = Model::new();
    model.nodes.push(Node::new(4, 0.0, 0.0, 0.0));
    model.nodes.push(Node::new(4, 1.0, 0.0, 0.0));

    let err = engine().write(model, &[]).unwrap_err();
    assert!(matches!(
        err,
        SyncError::DuplicateHandleRequest {
            space: HandleSpace::Node,
            handle: Handle(4)
        }
    ));
}

#[test]
fn bad_records_become_diagnostics() {
    let outcome = engine()
        .read(&[
            "SET\tNODE.3\t1\ta\tNO_RGB\t0\t0\t0",
            "SET\tNODE.3\t2\tb\tNO_RGB\t0\toops\t0",
            "SET\tEL.4\t7\tx\tNO_RGB\tHEX8\t1\t0\t1\t2\t3\t4\t5\t6\t7\t8\t0\t0\tNO_RLS",
            "SET\tEL.4\t8\tbeam\tNO_RGB\tBEAM\t1\t0\t1\t9\t0\t0\tNO_RLS",
        ])
        .unwrap();
    let diagnostics = &outcome.diagnostics;

    assert_eq!(outcome.model.nodes.len(), 1);
    assert_eq!(diagnostics.count(DiagnosticKind::MalformedRecord), 2);
    assert!(
        diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::MalformedRecord && d.entity == Some(EntityKind::Node))
    );

    // The beam is kept without coordinates; its missing node and property
    // are reported.
    assert_eq!(outcome.model.elements_1d.len(), 1);
    assert!(outcome.model.elements_1d[0].coordinates.is_empty());
    assert!(diagnostics.count(DiagnosticKind::UnresolvedReference) >= 1);
    assert!(
        diagnostics
            .iter()
            .any(|d| d.entity == Some(EntityKind::Element1D) && d.handle == Handle(8))
    );
}

#[test]
fn seeded_id_does_not_take_a_preset_handle() {
    let mut moved = Node::at(Vec3::new(5.0, 0.0, 0.0));
    moved.header.application_id = Some("x".into());
    let mut model = Model::new();
    model.nodes.push(moved);
    model.nodes.push(Node::new(4, 0.0, 0.0, 0.0));
    let seeds = [Seed::new(HandleSpace::Node, 4, Some("x"))];

    let written = engine().write(model, &seeds).unwrap();
    let handle_of = |id: Option<&str>| {
        written
            .model
            .nodes
            .iter()
            .find(|n| n.header.application_id.as_deref() == id)
            .map(|n| n.header.handle)
            .unwrap()
    };
    assert_eq!(handle_of(None), Handle(4));
    assert_eq!(handle_of(Some("x")), Handle(5));
    let nodes = written.records.iter().filter(|r| r.keyword == "NODE").count();
    assert_eq!(nodes, 2);
}

#[test]
fn misshapen_element_writes_neither_element_nor_nodes() {
    let mut beam = Element1D::between(Vec3::zeros(), Vec3::new(5.0, 0.0, 0.0), r(1));
    beam.coordinates.push(Vec3::new(10.0, 0.0, 0.0));
    let mut model = Model::new();
    model.elements_1d.push(beam);

    let written = engine().write(model, &[]).unwrap();
    assert!(!written.records.iter().any(|r| r.keyword == "EL"));
    assert!(!written.records.iter().any(|r| r.keyword == "NODE"));
    assert!(written.model.nodes.is_empty());
    assert!(
        written
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnresolvedReference
                && d.entity == Some(EntityKind::Element1D))
    );
}

#[test]
fn load_without_a_case_is_reported_not_written() {
    let mut model = Model::new();
    model.nodes.push(Node::new(1, 0.0, 0.0, 0.0));
    model.node_loads.push(gwa_model::NodeLoad {
        header: gwa_model::EntityHeader::new(0, "orphan"),
        targets: vec![r(1)],
        case: r(5),
        axis: gwa_model::LoadAxis::Global,
        vector: gwa_model::Dof6::from_array([0.0, 0.0, -1.0, 0.0, 0.0, 0.0]),
    });

    let written = engine().write(model, &[]).unwrap();
    assert!(!written.records.iter().any(|r| r.keyword == "LOAD_NODE"));
    assert!(
        written
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnresolvedReference
                && d.entity == Some(EntityKind::LoadNode))
    );
}
