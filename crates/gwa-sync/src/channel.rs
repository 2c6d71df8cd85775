//! Synchronous request/response channel to the analysis application.

use std::collections::BTreeMap;

use gwa_record::{GwaRecord, Verb, extract_sid, split_fields, unquote};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("command rejected: `{command}`: {reason}")]
    Rejected { command: String, reason: String },

    #[error("channel closed")]
    Closed,

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Command channel. Calls block until the reply arrives and are not assumed
/// idempotent.
pub trait GwaChannel {
    /// Issues one command and returns the reply lines.
    fn execute(&mut self, command: &str) -> Result<Vec<String>, ChannelError>;

    /// Issues a batch of commands with no reply.
    fn execute_batch(&mut self, commands: &[String]) -> Result<(), ChannelError>;
}

/// In-memory channel holding set records per keyword and index.
///
/// Understands `SET`, `SET_AT`, `GET_ALL\tKEYWORD` and `GET\tLIST\t"name"`.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    tables: BTreeMap<String, BTreeMap<u32, String>>,
    /// Commands received, in order.
    pub log: Vec<String>,
    /// Number of batches received, including rejected ones.
    pub batches: usize,
    /// Reject every batch, to exercise failure handling.
    pub reject_batches: bool,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored under a keyword.
    pub fn count(&self, keyword: &str) -> usize {
        self.tables
            .get(&base_keyword(keyword))
            .map_or(0, |table| table.len())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|table| table.is_empty())
    }

    fn store(&mut self, command: &str) -> Result<(), ChannelError> {
        let rejected = |reason: &str| ChannelError::Rejected {
            command: command.to_string(),
            reason: reason.to_string(),
        };
        let record = GwaRecord::parse(command).map_err(|err| rejected(&err.to_string()))?;
        let index = match record.verb {
            Verb::SetAt(index) => index,
            Verb::Set => record
                .handle(0)
                .map_err(|_| rejected("SET without a numeric handle"))?,
            Verb::None => return Err(rejected("not a SET command")),
        };
        let table = self.tables.entry(record.keyword.clone()).or_default();
        // SET appends past the end when given index 0.
        let index = if index.is_set() {
            index.0
        } else {
            table.keys().next_back().map_or(1, |last| last + 1)
        };
        table.insert(index, command.to_string());
        Ok(())
    }

    fn find_list(&self, name: &str) -> Vec<String> {
        let Some(lists) = self.tables.get("LIST") else {
            return Vec::new();
        };
        lists
            .values()
            .filter(|line| {
                GwaRecord::parse(line)
                    .ok()
                    .and_then(|r| r.text(1).ok())
                    .is_some_and(|n| n == name)
            })
            .cloned()
            .collect()
    }
}

impl GwaChannel for MemoryChannel {
    fn execute(&mut self, command: &str) -> Result<Vec<String>, ChannelError> {
        self.log.push(command.to_string());
        let fields = split_fields(command);
        let verb = fields.first().map(|f| f.to_ascii_uppercase()).unwrap_or_default();
        match (verb.as_str(), fields.len()) {
            ("GET_ALL", 2) => Ok(self
                .tables
                .get(&base_keyword(&fields[1]))
                .map(|table| table.values().cloned().collect())
                .unwrap_or_default()),
            ("GET", 3) if fields[1].eq_ignore_ascii_case("LIST") => {
                Ok(self.find_list(unquote(&fields[2])))
            }
            ("SET" | "SET_AT", _) => self.store(command).map(|_| Vec::new()),
            _ => Err(ChannelError::Rejected {
                command: command.to_string(),
                reason: "unsupported command".to_string(),
            }),
        }
    }

    fn execute_batch(&mut self, commands: &[String]) -> Result<(), ChannelError> {
        self.batches += 1;
        if self.reject_batches {
            return Err(ChannelError::Transport("batch rejected".to_string()));
        }
        for command in commands {
            self.log.push(command.clone());
            self.store(command)?;
        }
        Ok(())
    }
}

fn base_keyword(keyword: &str) -> String {
    extract_sid(keyword)
        .map(|sid| sid.keyword)
        .unwrap_or_else(|_| keyword.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_returns_records_by_keyword() {
        let mut channel = MemoryChannel::new();
        channel
            .execute_batch(&[
                "SET\tNODE.3\t2\tb\tNO_RGB\t1\t0\t0".to_string(),
                "SET\tNODE.3\t1\ta\tNO_RGB\t0\t0\t0".to_string(),
                "SET_AT\t1\tLOAD_NODE.3\tp\t1\t1\tGLOBAL\t0\t0\t-1\t0\t0\t0".to_string(),
            ])
            .unwrap();
        let nodes = channel.execute("GET_ALL\tNODE.3").unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].contains("\ta\t"));
        assert_eq!(channel.count("LOAD_NODE"), 1);
    }

    #[test]
    fn looks_up_named_lists() {
        let mut channel = MemoryChannel::new();
        channel.execute("SET\tLIST.1\t1\tcolumns\tELEMENT\t4 5 6").unwrap();
        let reply = channel.execute("GET\tLIST\t\"columns\"").unwrap();
        assert_eq!(reply.len(), 1);
        assert!(channel.execute("GET\tLIST\t\"beams\"").unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_commands() {
        let mut channel = MemoryChannel::new();
        assert!(matches!(
            channel.execute("DELETE\tNODE.3\t1"),
            Err(ChannelError::Rejected { .. })
        ));
    }
}
