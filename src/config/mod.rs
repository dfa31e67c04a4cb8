//! Configuration module for the properties exporter
//!
//! This module handles the two kinds of configuration a run consumes:
//! - The configuration file: which device to look for and which properties to dump
//! - Run settings: period, sample count, discovery timeout and output options
//!
//! # Configuration File
//!
//! The file is JSON (the default) or TOML (selected by a `.toml` extension)
//! with two required keys:
//!
//! ```json
//! {
//!     "targetDeviceProperties": { "sys/HardwareName": "Tag", "Serial": "1A2B" },
//!     "dumpProperties": [
//!         "Temperature",
//!         { "propertyName": "sys/Voltage", "alias": "Voltage" }
//!     ]
//! }
//! ```
//!
//! Dump entries may be bare property names or objects with an optional alias.
//! Their order is the output column order.
//!
//! # Example
//!
//! ```ignore
//! use properties_exporter::config::ConfigSettings;
//!
//! let config = ConfigSettings::load("device.json")?;
//! println!("{:?}", config.dump_properties.header());
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{ExporterError, Result, ResultExt};
use crate::types::{ELAPSED_COLUMN, LEADING_COLUMNS, TIMESTAMP_COLUMN};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Property key to expected value, used only to identify the target device
///
/// Keys are iterated in sorted order, which fixes the order matching reads them.
pub type TargetPropertyRules = BTreeMap<String, String>;

// ==================== Dump Properties ====================

/// A property to sample on every tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDumpProperty", rename_all = "camelCase")]
pub struct DumpProperty {
    /// Property key read from the device
    pub property_name: String,

    /// Column header; empty means the property name is used
    #[serde(skip_serializing_if = "String::is_empty")]
    pub alias: String,
}

/// Accepted on-disk shapes of a dump entry
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDumpProperty {
    Name(String),
    #[serde(rename_all = "camelCase")]
    Entry {
        property_name: String,
        #[serde(default)]
        alias: Option<String>,
    },
}

impl From<RawDumpProperty> for DumpProperty {
    fn from(raw: RawDumpProperty) -> Self {
        match raw {
            RawDumpProperty::Name(property_name) => DumpProperty {
                property_name,
                alias: String::new(),
            },
            RawDumpProperty::Entry {
                property_name,
                alias,
            } => DumpProperty {
                property_name,
                alias: alias.unwrap_or_default(),
            },
        }
    }
}

impl DumpProperty {
    /// Create a dump entry without alias
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            alias: String::new(),
        }
    }

    /// Set the column alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Header text for this property's column
    pub fn display_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.property_name
        } else {
            &self.alias
        }
    }
}

/// Ordered list of properties to dump; the order is the column order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DumpPropertySpec(Vec<DumpProperty>);

impl DumpPropertySpec {
    /// Create a spec from entries in column order
    pub fn new(entries: Vec<DumpProperty>) -> Self {
        Self(entries)
    }

    /// Entries in column order
    pub fn iter(&self) -> impl Iterator<Item = &DumpProperty> {
        self.0.iter()
    }

    /// Property names in column order
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|p| p.property_name.as_str())
    }

    /// Number of dumped properties
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if nothing is dumped
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of cells in every header and sample row
    pub fn row_width(&self) -> usize {
        self.0.len() + LEADING_COLUMNS
    }

    /// Header row: `Timestamp, ElapsedTime_ms, alias-or-name...`
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.row_width());
        header.push(TIMESTAMP_COLUMN.to_string());
        header.push(ELAPSED_COLUMN.to_string());
        header.extend(self.0.iter().map(|p| p.display_name().to_string()));
        header
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (index, entry) in self.0.iter().enumerate() {
            if entry.property_name.is_empty() {
                return Err(ExporterError::Config(format!(
                    "dumpProperties[{}] has an empty propertyName",
                    index
                )));
            }
            if !seen.insert(entry.property_name.as_str()) {
                return Err(ExporterError::Config(format!(
                    "dumpProperties lists '{}' more than once",
                    entry.property_name
                )));
            }
        }
        Ok(())
    }
}

impl From<Vec<DumpProperty>> for DumpPropertySpec {
    fn from(entries: Vec<DumpProperty>) -> Self {
        Self(entries)
    }
}

// ==================== Config File ====================

/// Format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension; anything but `.toml` is JSON
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Contents of the configuration file, immutable after load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSettings {
    /// Rules identifying the target device
    pub target_device_properties: TargetPropertyRules,

    /// Properties sampled on every tick, in column order
    pub dump_properties: DumpPropertySpec,
}

impl ConfigSettings {
    /// Parse configuration text in the given format
    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self> {
        let config: ConfigSettings = match format {
            ConfigFormat::Json => serde_json::from_str(text)
                .map_err(|e| ExporterError::Config(format!("Failed to parse JSON: {}", e)))?,
            ConfigFormat::Toml => toml::from_str(text)
                .map_err(|e| ExporterError::Config(format!("Failed to parse TOML: {}", e)))?,
        };
        config.dump_properties.validate()?;
        Ok(config)
    }

    /// Parse JSON configuration text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::parse(text, ConfigFormat::Json)
    }

    /// Load a configuration file, choosing the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not open config file {}", path.display()))?;

        let config = Self::parse(&content, ConfigFormat::from_path(path))?;
        tracing::info!(
            "Loaded config {:?}: {} target rules, {} dump properties",
            path,
            config.target_device_properties.len(),
            config.dump_properties.len()
        );
        Ok(config)
    }
}
