mod common;

use gwa_model::{EntityKind, Handle};
use gwa_sync::{ChannelError, Engine, GwaChannel, MemoryChannel, Seed, SyncConfig, SyncError};

#[test]
fn sent_model_comes_back_on_receive() {
    let engine = Engine::new(SyncConfig::default()).unwrap();
    let mut channel = MemoryChannel::new();
    let sent = engine.send(common::sample_model(), &[], &mut channel).unwrap();

    assert_eq!(channel.batches, 1);
    assert_eq!(channel.count("NODE"), 4);
    assert_eq!(channel.count("EL"), 3);
    assert_eq!(channel.count("LOAD_NODE"), 1);

    let received = engine.receive(&mut channel).unwrap();
    assert!(received.diagnostics.is_empty(), "{:?}", received.diagnostics);
    for kind in [EntityKind::Node, EntityKind::Member1D, EntityKind::LoadCase] {
        assert_eq!(received.model.handles(kind), sent.model.handles(kind));
    }
    assert_eq!(received.model.meshes.len(), 1);
}

#[test]
fn each_keyword_is_queried_once() {
    let engine = Engine::new(SyncConfig::default()).unwrap();
    let mut channel = MemoryChannel::new();
    engine.receive(&mut channel).unwrap();

    let queries: Vec<&String> = channel.log.iter().filter(|c| c.starts_with("GET_ALL")).collect();
    assert_eq!(queries.iter().filter(|c| c.as_str() == "GET_ALL\tEL").count(), 1);
    assert_eq!(queries.iter().filter(|c| c.as_str() == "GET_ALL\tMEMB").count(), 1);
    assert_eq!(queries[0], "GET_ALL\tMAT_STEEL");
}

#[test]
fn named_lists_are_fetched_for_loads() {
    let engine = Engine::new(SyncConfig::default()).unwrap();
    let mut channel = MemoryChannel::new();
    for command in [
        "SET\tNODE.3\t1\ta\tNO_RGB\t0\t0\t0",
        "SET\tNODE.3\t2\tb\tNO_RGB\t1\t0\t0",
        "SET\tLOAD_TITLE.2\t1\tdead\tDEAD",
        "SET\tLIST.1\t1\tsupports\tNODE\t1 2",
        "SET_AT\t1\tLOAD_NODE.3\tp\t\"supports\"\t1\tGLOBAL\t0\t0\t-5\t0\t0\t0",
    ] {
        channel.execute(command).unwrap();
    }

    let received = engine.receive(&mut channel).unwrap();
    assert!(channel.log.iter().any(|c| c == "GET\tLIST\t\"supports\""));
    let load = &received.model.node_loads[0];
    assert_eq!(load.targets.len(), 2);
    assert_eq!(load.header.handle, Handle(1));
}

#[test]
fn a_rejected_batch_fails_once_without_retry() {
    let engine = Engine::new(SyncConfig::default()).unwrap();
    let mut channel = MemoryChannel::new();
    channel.reject_batches = true;

    let err = engine
        .send(common::sample_model(), &[], &mut channel)
        .unwrap_err();
    assert!(matches!(err, SyncError::Channel(ChannelError::Transport(_))));
    assert_eq!(channel.batches, 1);
    assert!(channel.is_empty());
}

#[test]
fn resending_reuses_the_received_handles() {
    let engine = Engine::new(SyncConfig::default()).unwrap();
    let mut channel = MemoryChannel::new();
    engine.send(common::sample_model(), &[], &mut channel).unwrap();

    let received = engine.receive(&mut channel).unwrap();
    let seeds = Seed::from_model(&received.model);
    engine.send(received.model, &seeds, &mut channel).unwrap();

    assert_eq!(channel.batches, 2);
    assert_eq!(channel.count("NODE"), 4);
    assert_eq!(channel.count("EL"), 3);
}
