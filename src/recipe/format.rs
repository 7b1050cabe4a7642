// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are TOML files describing one pinned upstream release: its
//! identity, the options and settings it reacts to, where its source comes
//! from, how CMake should be driven, what gets packaged and what consumers
//! must link against.

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::options::OptionSet;
use crate::settings::{OperatingSystem, Settings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// A complete recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Identity and licensing metadata
    pub package: PackageSection,

    /// Settings the binary is insensitive to
    #[serde(default)]
    pub settings: SettingsSection,

    /// Declared options and their defaults
    #[serde(default)]
    pub options: OptionsSection,

    /// Source archive and checksum
    pub source: SourceSection,

    /// Build generator invocation
    #[serde(default)]
    pub build: BuildSection,

    /// Files copied into the package besides the install tree
    #[serde(default)]
    pub packaging: PackagingSection,

    /// Link metadata published to consumers
    #[serde(default)]
    pub package_info: PackageInfoSection,

    /// Extra `%(key)s` substitutions
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    /// Directory holding the recipe file; exports are resolved against it
    #[serde(skip)]
    pub export_root: Option<PathBuf>,
}

impl Recipe {
    /// Substitute `%(name)s`, `%(version)s`, `%(homepage)s` and custom variables
    pub fn substitute(&self, template: &str) -> String {
        let mut result = template.to_string();

        result = result.replace("%(name)s", &self.package.name);
        result = result.replace("%(version)s", &self.package.version);
        if let Some(homepage) = &self.package.homepage {
            result = result.replace("%(homepage)s", homepage.trim_end_matches('/'));
        }

        for (key, value) in &self.variables {
            result = result.replace(&format!("%({})s", key), value);
        }

        result
    }

    /// Download URL of the source archive
    pub fn archive_url(&self) -> String {
        self.substitute(&self.source.archive)
    }

    /// Archive file name taken from the URL
    pub fn archive_filename(&self) -> String {
        let url = self.archive_url();
        let name = url.rsplit('/').next().unwrap_or_default();
        if name.is_empty() {
            format!("{}-{}.tar.gz", self.package.name, self.package.version)
        } else {
            name.to_string()
        }
    }

    /// Parsed archive checksum
    pub fn checksum(&self) -> Result<Hash> {
        Hash::parse_prefixed(&self.source.checksum).map_err(|e| {
            Error::ParseError(format!("Invalid checksum '{}': {}", self.source.checksum, e))
        })
    }

    /// `{name}-{version}`
    pub fn name_version(&self) -> String {
        format!("{}-{}", self.package.name, self.package.version)
    }

    /// Folder the extracted sources are renamed to
    pub fn source_folder(&self) -> String {
        format!("{}_sources", self.name_version())
    }

    /// Folder CMake builds in
    pub fn build_folder(&self) -> String {
        format!("{}_build", self.name_version())
    }

    /// Top-level directory inside the source archive
    pub fn extracted_dir(&self) -> String {
        match &self.source.extract_dir {
            Some(dir) => self.substitute(dir),
            None => self.name_version(),
        }
    }

    /// Option set holding the declared defaults
    pub fn default_options(&self) -> OptionSet {
        OptionSet::from_defaults(&self.options.defaults)
    }

    /// `config_options` hook: drop options that do not exist on the target OS
    pub fn config_options(&self, settings: &Settings, options: &mut OptionSet) {
        for (name, systems) in &self.options.unsupported {
            if systems.contains(&settings.os) && options.remove(name).is_some() {
                debug!("Removed option {} for {}", name, settings.os);
            }
        }
    }

    /// `configure` hook: discard settings the binary does not depend on
    pub fn configure(&self, settings: &mut Settings) -> Result<()> {
        for key in &self.settings.ignore {
            settings.remove(key)?;
            debug!("Ignoring setting {}", key);
        }
        Ok(())
    }

    /// Static link table entry for an OS
    pub fn platform_linkage(&self, os: OperatingSystem) -> Option<&PlatformLinkage> {
        self.package_info.platform.iter().find(|p| p.os == os)
    }
}

/// Package identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    /// Where the recipe itself is maintained
    #[serde(default)]
    pub url: Option<String>,
    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// Settings handling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsSection {
    /// Sub-settings removed by `configure` (e.g. `compiler.libcxx`)
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Options declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsSection {
    /// Option name to default value
    #[serde(default)]
    pub defaults: BTreeMap<String, bool>,

    /// Option name to the systems where it does not exist
    #[serde(default)]
    pub unsupported: BTreeMap<String, Vec<OperatingSystem>>,
}

/// Source archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Archive URL template, e.g. `%(homepage)s/archive/%(version)s.tar.gz`
    pub archive: String,

    /// Prefixed checksum (`sha256:...`)
    pub checksum: String,

    /// Top-level directory inside the archive (default `%(name)s-%(version)s`)
    #[serde(default)]
    pub extract_dir: Option<String>,
}

/// Supported external build generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    Cmake,
}

/// A cache definition value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Definition {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Definition {
    /// Render for `-DNAME=value`
    pub fn to_cmake(&self) -> String {
        match self {
            Definition::Bool(true) => "ON".to_string(),
            Definition::Bool(false) => "OFF".to_string(),
            Definition::Int(i) => i.to_string(),
            Definition::Str(s) => s.clone(),
        }
    }
}

/// Build instructions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default)]
    pub generator: GeneratorKind,

    /// Extra cache definitions passed at configure time
    #[serde(default)]
    pub definitions: BTreeMap<String, Definition>,

    /// Parallel jobs (default: kitchen setting)
    #[serde(default)]
    pub jobs: Option<u32>,
}

/// A glob copy into the package directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRule {
    /// File name pattern, e.g. `*.pdb`
    pub pattern: String,

    /// Destination relative to the package directory
    #[serde(default)]
    pub dst: String,

    /// Keep the matched file's relative directory under `dst`
    #[serde(default = "default_keep_path")]
    pub keep_path: bool,
}

fn default_keep_path() -> bool {
    true
}

/// Packaging instructions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackagingSection {
    /// Files shipped with the recipe and copied flat into the package root
    #[serde(default)]
    pub exports: Vec<String>,

    #[serde(default)]
    pub copy: Vec<CopyRule>,
}

/// Consumption metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfoSection {
    /// Discover library names from the package's `lib/` directory
    #[serde(default = "default_collect_libs")]
    pub collect_libs: bool,

    #[serde(default)]
    pub platform: Vec<PlatformLinkage>,
}

impl Default for PackageInfoSection {
    fn default() -> Self {
        Self {
            collect_libs: true,
            platform: Vec::new(),
        }
    }
}

fn default_collect_libs() -> bool {
    true
}

/// System libraries and frameworks a consumer links on one OS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformLinkage {
    pub os: OperatingSystem,

    /// Ordered system library names; order is link order
    #[serde(default)]
    pub system_libs: Vec<String>,

    /// System frameworks (Apple platforms)
    #[serde(default)]
    pub frameworks: Vec<String>,
}

impl PlatformLinkage {
    /// `-framework A -framework B ...`, or `None` without frameworks
    pub fn framework_flags(&self) -> Option<String> {
        if self.frameworks.is_empty() {
            return None;
        }
        Some(
            self.frameworks
                .iter()
                .map(|f| format!("-framework {}", f))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }
}
