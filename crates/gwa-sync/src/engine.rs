//! Drives one read or write operation over every entity kind.

use std::collections::BTreeSet;

use gwa_model::{EntityKind, Handle, Model};
use gwa_record::{GwaRecord, RecordError, parse_handle_list};

use crate::allocator::Seed;
use crate::channel::GwaChannel;
use crate::config::SyncConfig;
use crate::context::{ReadContext, WriteContext};
use crate::converters::{RecordSet, converter, split_keyword};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::registry::{Direction, Progress, Registration, Schedule, registrations};

const LIST: &str = "LIST";

/// Result of a read.
#[derive(Debug)]
pub struct ReadOutcome {
    pub model: Model,
    pub diagnostics: Diagnostics,
    /// Kinds in the order they were read.
    pub order: Vec<EntityKind>,
}

/// Result of a write.
#[derive(Debug)]
pub struct WriteOutcome {
    /// Records ordered by the read order of their kind.
    pub records: Vec<GwaRecord>,
    /// The model as written, with every handle assigned and any synthesized
    /// nodes and axes included.
    pub model: Model,
    pub diagnostics: Diagnostics,
    /// Kinds in the order they were written.
    pub order: Vec<EntityKind>,
}

impl WriteOutcome {
    /// Encoded command lines, ready for a batch.
    pub fn commands(&self) -> Vec<String> {
        self.records.iter().map(GwaRecord::encode).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    pub config: SyncConfig,
    read_schedule: Schedule,
    write_schedule: Schedule,
}

impl Engine {
    pub fn new(config: SyncConfig) -> Result<Self> {
        Self::with_registrations(config, &registrations())
    }

    /// Engine over a custom registration table. Cycles are reported here,
    /// before any operation runs.
    pub fn with_registrations(config: SyncConfig, registrations: &[Registration]) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            read_schedule: Schedule::build(registrations, Direction::Read)?,
            write_schedule: Schedule::build(registrations, Direction::Write)?,
            config,
        })
    }

    pub fn read_schedule(&self) -> &Schedule {
        &self.read_schedule
    }

    pub fn write_schedule(&self) -> &Schedule {
        &self.write_schedule
    }

    /// Builds a model from record lines.
    ///
    /// Lines that do not parse, and records that do not fit their layout,
    /// become diagnostics. `LIST` records define named lists for the loads.
    pub fn read<S: AsRef<str>>(&self, lines: &[S]) -> Result<ReadOutcome> {
        let mut ctx = ReadContext::new(&self.config);
        let mut records = RecordSet::new();
        for line in lines {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            match GwaRecord::parse(line) {
                Ok(record) if record.keyword.eq_ignore_ascii_case(LIST) => {
                    if let Err(err) = define_list(&mut ctx, &record) {
                        ctx.diagnostics.malformed(None, Handle::UNSET, &err);
                    }
                }
                Ok(record) => records.push(record),
                Err(err) => ctx.diagnostics.malformed(None, Handle::UNSET, &err),
            }
        }

        let mut progress = Progress::new(&self.read_schedule);
        for &kind in self.read_schedule.order() {
            progress.start(kind)?;
            let converter = converter(kind);
            let selected = records.select(converter.keywords());
            converter.read(&selected, &mut ctx);
            log::debug!("read {kind}: {} records, {} entities", selected.len(), ctx.model.len(kind));
            progress.finish(kind);
        }

        log::info!(
            "read {} entities from {} records with {} diagnostics",
            ctx.model.summary().total_entities,
            records.len(),
            ctx.diagnostics.len()
        );
        Ok(ReadOutcome {
            model: ctx.model,
            diagnostics: ctx.diagnostics,
            order: self.read_schedule.order().to_vec(),
        })
    }

    /// Serializes a model. `seeds` are the handles already present on the
    /// receiving side; new handles are allocated above them.
    pub fn write(&self, model: Model, seeds: &[Seed]) -> Result<WriteOutcome> {
        let mut ctx = WriteContext::new(&self.config, model, seeds);
        let mut progress = Progress::new(&self.write_schedule);
        for &kind in self.write_schedule.order() {
            progress.start(kind)?;
            converter(kind).write(&mut ctx)?;
            log::debug!("wrote {kind}: {} records", ctx.records(kind).len());
            progress.finish(kind);
        }

        let (records, model, diagnostics) = ctx.finish(self.read_schedule.order());
        log::info!(
            "wrote {} records with {} diagnostics",
            records.len(),
            diagnostics.len()
        );
        Ok(WriteOutcome {
            records,
            model,
            diagnostics,
            order: self.write_schedule.order().to_vec(),
        })
    }

    /// Queries every keyword in read order and reads the replies. Named
    /// lists referenced by load records are fetched with `GET LIST`.
    pub fn receive(&self, channel: &mut dyn GwaChannel) -> Result<ReadOutcome> {
        let mut lines = Vec::new();
        let mut queried = BTreeSet::new();
        for &kind in self.read_schedule.order() {
            for keyword in converter(kind).keywords() {
                let (name, _) = split_keyword(keyword);
                if queried.insert(name) {
                    lines.extend(channel.execute(&format!("GET_ALL\t{name}"))?);
                }
            }
        }

        let mut fetched = BTreeSet::new();
        for name in referenced_lists(&lines) {
            if fetched.insert(name.clone()) {
                lines.extend(channel.execute(&format!("GET\tLIST\t\"{name}\""))?);
            }
        }
        self.read(&lines)
    }

    /// Writes the model and sends every record in one batch. A failed batch
    /// is not retried.
    pub fn send(&self, model: Model, seeds: &[Seed], channel: &mut dyn GwaChannel) -> Result<WriteOutcome> {
        let outcome = self.write(model, seeds)?;
        channel.execute_batch(&outcome.commands())?;
        Ok(outcome)
    }
}

/// `LIST   handle, name, type, list`
fn define_list(ctx: &mut ReadContext, record: &GwaRecord) -> std::result::Result<(), RecordError> {
    record.expect_len(4)?;
    let name = record.text(1)?;
    let handles = parse_handle_list(record.field(3)?, |_| None)?;
    ctx.define_list(name, handles);
    Ok(())
}

/// Quoted list names in the target field of load records.
fn referenced_lists(lines: &[String]) -> Vec<String> {
    let mut names = Vec::new();
    for line in lines {
        let Ok(record) = GwaRecord::parse(line) else {
            continue;
        };
        if !record.keyword.to_ascii_uppercase().starts_with("LOAD_") {
            continue;
        }
        let Some(targets) = record.fields.get(1) else {
            continue;
        };
        names.extend(quoted_names(targets).into_iter().filter(|n| !n.is_empty()));
    }
    names
}

fn quoted_names(text: &str) -> Vec<String> {
    text.split('"')
        .skip(1)
        .step_by(2)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_names_come_from_load_records() {
        let lines = vec![
            "SET_AT\t1\tLOAD_NODE.3\tp\t\"supports\" 4\t1\tGLOBAL\t0\t0\t-1\t0\t0\t0".to_string(),
            "SET\tNODE.3\t1\t\"quoted\"\tNO_RGB\t0\t0\t0".to_string(),
        ];
        assert_eq!(referenced_lists(&lines), vec!["supports".to_string()]);
    }

    #[test]
    fn list_records_define_named_lists() {
        let engine = Engine::new(SyncConfig::default()).unwrap();
        let outcome = engine
            .read(&[
                "SET\tLOAD_TITLE.2\t1\tdead\tDEAD",
                "SET\tLIST.1\t1\tpair\tNODE\t3 4",
                "SET_AT\t1\tLOAD_NODE.3\tp\t\"pair\"\t1\tGLOBAL\t0\t0\t-1\t0\t0\t0",
            ])
            .unwrap();
        assert_eq!(outcome.model.node_loads[0].targets.len(), 2);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn unparsable_lines_are_diagnostics() {
        let engine = Engine::new(SyncConfig::default()).unwrap();
        let outcome = engine.read(&["SET_AT\tx\tNODE.3", "SET\tNODE.3\t1\tn\tNO_RGB\t0\t0\t0"]).unwrap();
        assert_eq!(outcome.model.nodes.len(), 1);
        assert_eq!(outcome.diagnostics.len(), 1);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = SyncConfig {
            coincident_node_tolerance: -1.0,
            ..SyncConfig::default()
        };
        assert!(Engine::new(config).is_err());
    }
}
