//! Reconciles a [`gwa_model::Model`] with the GWA text protocol.
//!
//! An [`Engine`] reads records into a model and writes a model back out as
//! records, one entity kind at a time in dependency order. Handles are
//! allocated per handle space, coincident nodes are merged on write and
//! edge-connected shells are grouped into meshes on read.
//!
//! ```no_run
//! use gwa_sync::{Engine, MemoryChannel, Seed, SyncConfig};
//!
//! let engine = Engine::new(SyncConfig::default())?;
//! let mut channel = MemoryChannel::new();
//! let received = engine.receive(&mut channel)?;
//! let seeds = Seed::from_model(&received.model);
//! engine.send(received.model, &seeds, &mut channel)?;
//! # Ok::<(), gwa_sync::SyncError>(())
//! ```

pub mod allocator;
pub mod channel;
pub mod config;
pub mod context;
pub mod converters;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod merge;
pub mod registry;

pub use allocator::{HandleAllocator, Seed};
pub use channel::{ChannelError, GwaChannel, MemoryChannel};
pub use config::SyncConfig;
pub use context::{ReadContext, WriteContext};
pub use converters::{Converter, converter};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use engine::{Engine, ReadOutcome, WriteOutcome};
pub use error::{Result, SyncError};
pub use merge::NodeIndex;
pub use registry::{Direction, KindState, Progress, Registration, Schedule, registrations};
