//! Session file format and operations.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use floatmix_core::{AudioFormat, AudioInfo, AudioLayout, DEFAULT_BUFFER_SAMPLES};

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_session};

/// A host-driven mixing run.
///
/// # TOML Format
///
/// ```toml
/// name = "two-track"
///
/// [format]
/// rate = 48000
/// channels = 1
///
/// [node]
/// buffers = 3
/// block_size = 1024
///
/// [[input]]
/// path = "vocals.wav"
///
/// [[input]]
/// path = "guitar.wav"
///
/// [output]
/// path = "mix.wav"
/// bit_depth = 32
/// ```
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Name of the session.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Stream format negotiated on every port.
    #[serde(default)]
    pub format: FormatConfig,

    /// Buffer geometry installed on every port.
    #[serde(default)]
    pub node: NodeConfig,

    /// Input files, one per input port, in port order.
    #[serde(default, rename = "input")]
    pub inputs: Vec<InputConfig>,

    /// Output file.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[format]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatConfig {
    /// Sample rate in Hz.
    #[serde(default = "default_rate")]
    pub rate: u32,
    /// Channels per stream.
    #[serde(default = "default_channels")]
    pub channels: u32,
}

/// `[node]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeConfig {
    /// Buffers installed per port.
    #[serde(default = "default_buffers")]
    pub buffers: u32,
    /// Samples per cycle, published to the node as the output range hint.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

/// One `[[input]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputConfig {
    /// WAV file feeding the input port.
    pub path: PathBuf,
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    /// WAV file receiving the mix.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// Output sample width: 16, 24 or 32 (float).
    #[serde(default = "default_bit_depth")]
    pub bit_depth: u16,
}

fn default_rate() -> u32 {
    48000
}

fn default_channels() -> u32 {
    1
}

fn default_buffers() -> u32 {
    3
}

fn default_block_size() -> usize {
    DEFAULT_BUFFER_SAMPLES
}

fn default_output_path() -> PathBuf {
    PathBuf::from("mix.wav")
}

fn default_bit_depth() -> u16 {
    32
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            channels: default_channels(),
        }
    }
}

impl FormatConfig {
    /// The node format this section describes.
    pub fn audio_info(&self) -> AudioInfo {
        AudioInfo::new(
            AudioFormat::F32,
            AudioLayout::NonInterleaved,
            self.rate,
            self.channels,
        )
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            buffers: default_buffers(),
            block_size: default_block_size(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            bit_depth: default_bit_depth(),
        }
    }
}

impl Session {
    /// Create a session with default sections and no inputs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            format: FormatConfig::default(),
            node: NodeConfig::default(),
            inputs: Vec::new(),
            output: OutputConfig::default(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append an input file.
    pub fn add_input(&mut self, path: impl Into<PathBuf>) {
        self.inputs.push(InputConfig { path: path.into() });
    }

    /// Load a session from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let session: Session = toml::from_str(&content)?;
        Ok(session)
    }

    /// Load a session from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the session to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the session to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the session against the node's limits.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_session(self)
    }

    /// Resolve relative input and output paths against `base`, usually the
    /// directory containing the session file.
    pub fn resolve_paths(&mut self, base: &Path) {
        for input in &mut self.inputs {
            if input.path.is_relative() {
                input.path = base.join(&input.path);
            }
        }
        if self.output.path.is_relative() {
            self.output.path = base.join(&self.output.path);
        }
    }

    /// Input file paths in port order.
    pub fn input_paths(&self) -> impl Iterator<Item = &Path> {
        self.inputs.iter().map(|i| i.path.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let session = Session::from_toml("name = \"bare\"").unwrap();
        assert_eq!(session.format, FormatConfig::default());
        assert_eq!(session.node.buffers, 3);
        assert_eq!(session.node.block_size, 1024);
        assert_eq!(session.output.bit_depth, 32);
        assert!(session.inputs.is_empty());
    }

    #[test]
    fn full_toml_parses() {
        let session = Session::from_toml(
            r#"
name = "two-track"
description = "vocals and guitar"

[format]
rate = 44100

[node]
buffers = 4
block_size = 256

[[input]]
path = "a.wav"

[[input]]
path = "b.wav"

[output]
path = "out.wav"
bit_depth = 16
"#,
        )
        .unwrap();
        assert_eq!(session.format.rate, 44100);
        assert_eq!(session.format.channels, 1);
        assert_eq!(session.node.buffers, 4);
        assert_eq!(session.inputs.len(), 2);
        assert_eq!(session.inputs[1].path, PathBuf::from("b.wav"));
        assert_eq!(session.output.bit_depth, 16);
    }

    #[test]
    fn toml_round_trip() {
        let mut session = Session::new("rt").with_description("round trip");
        session.add_input("x.wav");
        let text = session.to_toml().unwrap();
        assert!(text.contains("[[input]]"), "got: {text}");
        assert_eq!(Session::from_toml(&text).unwrap(), session);
    }

    #[test]
    fn resolve_paths_keeps_absolute() {
        let mut session = Session::new("paths");
        session.add_input("rel.wav");
        session.add_input("/abs/in.wav");
        session.resolve_paths(Path::new("/sessions"));
        assert_eq!(session.inputs[0].path, PathBuf::from("/sessions/rel.wav"));
        assert_eq!(session.inputs[1].path, PathBuf::from("/abs/in.wav"));
        assert_eq!(session.output.path, PathBuf::from("/sessions/mix.wav"));
    }

    #[test]
    fn audio_info_is_float_non_interleaved() {
        let info = FormatConfig::default().audio_info();
        assert_eq!(info.format, AudioFormat::F32);
        assert_eq!(info.layout, AudioLayout::NonInterleaved);
        assert_eq!(info.rate, 48000);
    }
}
