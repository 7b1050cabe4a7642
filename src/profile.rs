// src/profile.rs

//! Build profiles
//!
//! A profile is a small TOML file naming the settings and option values for a
//! cook. Anything it leaves out is detected from the host (settings) or taken
//! from the recipe defaults (options).
//!
//! ```toml
//! [settings]
//! os = "Linux"
//! arch = "x86_64"
//! build_type = "Release"
//!
//! [settings.compiler]
//! name = "gcc"
//! version = "13"
//! libcxx = "libstdc++11"
//!
//! [options]
//! shared = true
//! ```

use crate::error::{Error, Result};
use crate::options::OptionSet;
use crate::settings::{Arch, BuildType, Compiler, OperatingSystem, Settings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Settings section of a profile; unset fields fall back to the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    #[serde(default)]
    pub os: Option<OperatingSystem>,
    #[serde(default)]
    pub arch: Option<Arch>,
    #[serde(default)]
    pub compiler: Option<Compiler>,
    #[serde(default)]
    pub build_type: Option<BuildType>,
}

/// A build profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub settings: ProfileSettings,
    #[serde(default)]
    pub options: BTreeMap<String, bool>,
}

impl Profile {
    /// Parse a profile from TOML
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid profile: {}", e)))
    }

    /// Load a profile file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading profile {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read profile {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Profile pinned to an OS, everything else default
    pub fn for_os(os: OperatingSystem) -> Self {
        Self {
            settings: ProfileSettings {
                os: Some(os),
                ..Default::default()
            },
            options: BTreeMap::new(),
        }
    }

    /// Resolve the full settings, filling gaps from the host
    ///
    /// When the profile names an OS other than the host, the architecture
    /// defaults to x86_64 rather than the host's.
    pub fn resolve_settings(&self) -> Result<Settings> {
        let os = match self.settings.os {
            Some(os) => os,
            None => OperatingSystem::host()?,
        };
        let arch = match self.settings.arch {
            Some(arch) => arch,
            None if OperatingSystem::host().ok() == Some(os) => Arch::host()?,
            None => Arch::X86_64,
        };
        let compiler = self
            .settings
            .compiler
            .clone()
            .unwrap_or_else(|| Compiler::default_for(os));
        let build_type = self.settings.build_type.unwrap_or_default();

        Ok(Settings::new(os, arch, compiler, build_type))
    }

    /// Apply the profile's option values on top of a configured option set
    ///
    /// `declared` holds every option the recipe knows. A value for a declared
    /// option that `config_options` already removed is skipped and returned
    /// as a warning; an undeclared option is an error.
    pub fn apply_options(
        &self,
        options: &mut OptionSet,
        declared: &BTreeMap<String, bool>,
    ) -> Result<Vec<String>> {
        let mut warnings = Vec::new();
        for (name, value) in &self.options {
            if options.contains(name) {
                options.set(name, *value)?;
            } else if declared.contains_key(name) {
                let message = format!("Option {} does not apply to this OS, ignoring", name);
                warn!("{}", message);
                warnings.push(message);
            } else {
                return Err(Error::InvalidOption(format!("Unknown option: {}", name)));
            }
        }
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_profile() {
        let profile = Profile::parse(
            r#"
[settings]
os = "Macos"
arch = "armv8"
build_type = "Debug"

[settings.compiler]
name = "apple-clang"
version = "15"
libcxx = "libc++"

[options]
shared = true
"#,
        )
        .unwrap();

        let settings = profile.resolve_settings().unwrap();
        assert_eq!(settings.os, OperatingSystem::Macos);
        assert_eq!(settings.arch, Arch::Armv8);
        assert_eq!(settings.build_type, BuildType::Debug);
        assert_eq!(settings.compiler.version.as_deref(), Some("15"));
        assert_eq!(profile.options.get("shared"), Some(&true));
    }

    #[test]
    fn test_partial_profile_uses_defaults() {
        let profile = Profile::parse("[settings]\nos = \"Windows\"\n").unwrap();
        let settings = profile.resolve_settings().unwrap();
        assert_eq!(settings.os, OperatingSystem::Windows);
        assert_eq!(settings.compiler.name, "msvc");
        assert_eq!(settings.build_type, BuildType::Release);
    }

    #[test]
    fn test_invalid_profile() {
        assert!(Profile::parse("[settings]\nos = \"Plan9\"\n").is_err());
        assert!(Profile::parse("not toml {").is_err());
    }

    #[test]
    fn test_apply_options_rejects_unknown() {
        let mut profile = Profile::for_os(OperatingSystem::Linux);
        profile.options.insert("static".to_string(), true);

        let declared = BTreeMap::from([("shared".to_string(), false)]);
        let mut options = OptionSet::from_defaults(&declared);
        assert!(profile.apply_options(&mut options, &declared).is_err());
    }

    #[test]
    fn test_apply_options_skips_removed() {
        let mut profile = Profile::for_os(OperatingSystem::Windows);
        profile.options.insert("fPIC".to_string(), false);
        profile.options.insert("shared".to_string(), true);

        let declared = BTreeMap::from([("shared".to_string(), false), ("fPIC".to_string(), true)]);
        let mut options = OptionSet::from_defaults(&declared);
        options.remove("fPIC");

        let warnings = profile.apply_options(&mut options, &declared).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(options.get("shared"), Some(true));
        assert!(!options.contains("fPIC"));
    }

    #[test]
    fn test_shipped_profiles_parse() {
        for content in [
            include_str!("../profiles/linux.toml"),
            include_str!("../profiles/macos.toml"),
            include_str!("../profiles/windows.toml"),
        ] {
            let profile = Profile::parse(content).unwrap();
            assert!(profile.settings.os.is_some());
            profile.resolve_settings().unwrap();
        }
    }
}
