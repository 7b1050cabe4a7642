// src/settings.rs

//! Build settings: target OS, architecture, compiler and build type
//!
//! Settings describe the binary variant being produced. The driver hands them
//! to every lifecycle hook; `configure` may drop settings the package is
//! insensitive to so they no longer take part in the package id.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Target operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OperatingSystem {
    Windows,
    Linux,
    Macos,
    FreeBSD,
}

impl OperatingSystem {
    pub const ALL: [OperatingSystem; 4] = [Self::Windows, Self::Linux, Self::Macos, Self::FreeBSD];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Linux => "Linux",
            Self::Macos => "Macos",
            Self::FreeBSD => "FreeBSD",
        }
    }

    /// The OS this binary was compiled for
    pub fn host() -> Result<Self> {
        match std::env::consts::OS {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::Macos),
            "freebsd" => Ok(Self::FreeBSD),
            other => Err(Error::InvalidSetting(format!("unsupported host OS: {}", other))),
        }
    }
}

impl FromStr for OperatingSystem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::Macos),
            "freebsd" => Ok(Self::FreeBSD),
            _ => Err(Error::InvalidSetting(format!("unknown os: {}", s))),
        }
    }
}

/// Target architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Arch {
    X86,
    X86_64,
    Armv7,
    Armv8,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Armv7 => "armv7",
            Self::Armv8 => "armv8",
        }
    }

    pub fn host() -> Result<Self> {
        match std::env::consts::ARCH {
            "x86" => Ok(Self::X86),
            "x86_64" => Ok(Self::X86_64),
            "arm" => Ok(Self::Armv7),
            "aarch64" => Ok(Self::Armv8),
            other => Err(Error::InvalidSetting(format!("unsupported host arch: {}", other))),
        }
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "x86" | "i686" => Ok(Self::X86),
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "armv7" | "arm" => Ok(Self::Armv7),
            "armv8" | "aarch64" | "arm64" => Ok(Self::Armv8),
            _ => Err(Error::InvalidSetting(format!("unknown arch: {}", s))),
        }
    }
}

/// CMake build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        }
    }
}

impl FromStr for BuildType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            "relwithdebinfo" => Ok(Self::RelWithDebInfo),
            "minsizerel" => Ok(Self::MinSizeRel),
            _ => Err(Error::InvalidSetting(format!("unknown build_type: {}", s))),
        }
    }
}

macro_rules! string_conversions {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<String> for $ty {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> String {
                value.as_str().to_string()
            }
        }
    )*};
}

string_conversions!(OperatingSystem, Arch, BuildType);

/// Compiler identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compiler {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// C++ standard library flavour (libstdc++11, libc++, ...)
    #[serde(default)]
    pub libcxx: Option<String>,
}

impl Compiler {
    /// Default compiler for an OS
    pub fn default_for(os: OperatingSystem) -> Self {
        match os {
            OperatingSystem::Windows => Self {
                name: "msvc".to_string(),
                version: None,
                libcxx: None,
            },
            OperatingSystem::Macos => Self {
                name: "apple-clang".to_string(),
                version: None,
                libcxx: Some("libc++".to_string()),
            },
            OperatingSystem::Linux | OperatingSystem::FreeBSD => Self {
                name: "gcc".to_string(),
                version: None,
                libcxx: Some("libstdc++11".to_string()),
            },
        }
    }
}

/// Setting keys understood by [`Settings::set`] and [`Settings::remove`]
pub const SETTING_KEYS: &[&str] = &[
    "os",
    "arch",
    "compiler",
    "compiler.version",
    "compiler.libcxx",
    "build_type",
];

/// Sub-settings a recipe may declare itself insensitive to
pub const REMOVABLE_SETTINGS: &[&str] = &["compiler.version", "compiler.libcxx"];

/// Settings for one binary variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub os: OperatingSystem,
    pub arch: Arch,
    pub compiler: Compiler,
    pub build_type: BuildType,
    removed: BTreeSet<String>,
}

impl Settings {
    pub fn new(os: OperatingSystem, arch: Arch, compiler: Compiler, build_type: BuildType) -> Self {
        Self {
            os,
            arch,
            compiler,
            build_type,
            removed: BTreeSet::new(),
        }
    }

    /// Settings for the given OS with its default compiler, x86_64, Release
    pub fn for_os(os: OperatingSystem) -> Self {
        Self::new(os, Arch::X86_64, Compiler::default_for(os), BuildType::Release)
    }

    /// Settings matching the host
    pub fn detect() -> Result<Self> {
        let os = OperatingSystem::host()?;
        Ok(Self::new(os, Arch::host()?, Compiler::default_for(os), BuildType::Release))
    }

    /// Override one setting from a `key=value` pair
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.removed.contains(key) {
            return Err(Error::InvalidSetting(format!(
                "setting '{}' was removed by the recipe",
                key
            )));
        }
        match key {
            "os" => self.os = value.parse()?,
            "arch" => self.arch = value.parse()?,
            "build_type" => self.build_type = value.parse()?,
            "compiler" => self.compiler.name = value.to_string(),
            "compiler.version" => self.compiler.version = Some(value.to_string()),
            "compiler.libcxx" => self.compiler.libcxx = Some(value.to_string()),
            _ => return Err(Error::InvalidSetting(format!("unknown setting: {}", key))),
        }
        Ok(())
    }

    /// Parse and apply a `key=value` override
    pub fn apply_override(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            Error::ParseError(format!("expected key=value, got '{}'", assignment))
        })?;
        self.set(key.trim(), value.trim())
    }

    /// Drop a sub-setting; the binary no longer varies with it
    pub fn remove(&mut self, key: &str) -> Result<()> {
        match key {
            "compiler.version" => self.compiler.version = None,
            "compiler.libcxx" => self.compiler.libcxx = None,
            _ if SETTING_KEYS.contains(&key) => {
                return Err(Error::InvalidSetting(format!("setting '{}' cannot be removed", key)));
            }
            _ => return Err(Error::InvalidSetting(format!("unknown setting: {}", key))),
        }
        self.removed.insert(key.to_string());
        Ok(())
    }

    pub fn is_removed(&self, key: &str) -> bool {
        self.removed.contains(key)
    }

    /// Canonical `(key, value)` listing of every present setting
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            ("arch", self.arch.to_string()),
            ("build_type", self.build_type.to_string()),
            ("compiler", self.compiler.name.clone()),
        ];
        if let Some(libcxx) = &self.compiler.libcxx {
            entries.push(("compiler.libcxx", libcxx.clone()));
        }
        if let Some(version) = &self.compiler.version {
            entries.push(("compiler.version", version.clone()));
        }
        entries.push(("os", self.os.to_string()));
        entries
    }
}
