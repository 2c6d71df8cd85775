use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Settings for one receive or send operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Distance below which two node positions are the same node.
    pub coincident_node_tolerance: f64,
    /// Group edge-connected 2D elements into meshes on read.
    pub consolidate_meshes: bool,
    /// Written into the stream id tag of every record when set.
    pub stream_id: Option<String>,
    /// Write keyword versions (`NODE.3` rather than `NODE`).
    pub version_tags: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            coincident_node_tolerance: 1e-3,
            consolidate_meshes: true,
            stream_id: None,
            version_tags: true,
        }
    }
}

impl SyncConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: SyncConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let tolerance = self.coincident_node_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(SyncError::Config(format!(
                "coincident_node_tolerance must be a non-negative number, got {tolerance}"
            )));
        }
        if let Some(stream) = &self.stream_id
            && stream.contains(['{', '}', ':', '\t'])
        {
            return Err(SyncError::Config(format!(
                "stream_id `{stream}` contains a reserved character"
            )));
        }
        Ok(())
    }
}
