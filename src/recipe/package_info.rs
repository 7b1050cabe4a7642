// src/recipe/package_info.rs

//! Consumption metadata published with a package
//!
//! After packaging, the library names found in the package are combined with
//! the recipe's static per-OS table (system libraries on Linux, frameworks on
//! Macos) and written out in forms downstream builds understand.

use crate::error::{Error, Result};
use crate::options::OptionSet;
use crate::recipe::format::Recipe;
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

const LIBRARY_EXTENSIONS: &[&str] = &["so", "a", "lib", "dylib"];

/// Link metadata for one built package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub package_id: String,
    pub shared: bool,
    /// Collected library names followed by the OS's system libraries
    pub libs: Vec<String>,
    /// The system libraries appended to `libs`
    pub system_libs: Vec<String>,
    pub frameworks: Vec<String>,
    pub exelinkflags: Vec<String>,
    pub sharedlinkflags: Vec<String>,
    /// Directories relative to the package root
    pub include_dirs: Vec<String>,
    pub lib_dirs: Vec<String>,
    pub bin_dirs: Vec<String>,
}

impl PackageInfo {
    /// `package_info` hook
    pub fn resolve(
        recipe: &Recipe,
        settings: &Settings,
        options: &OptionSet,
        package_id: &str,
        package_dir: &Path,
    ) -> Result<Self> {
        let mut libs = if recipe.package_info.collect_libs {
            collect_libs(package_dir)?
        } else {
            Vec::new()
        };

        let mut system_libs = Vec::new();
        let mut frameworks = Vec::new();
        let mut exelinkflags = Vec::new();
        let mut sharedlinkflags = Vec::new();

        if let Some(linkage) = recipe.platform_linkage(settings.os) {
            system_libs = linkage.system_libs.clone();
            libs.extend(linkage.system_libs.iter().cloned());

            if let Some(flags) = linkage.framework_flags() {
                frameworks = linkage.frameworks.clone();
                exelinkflags.push(flags.clone());
                sharedlinkflags.push(flags);
            }
        }

        debug!("Package info for {}: libs={:?}", recipe.package.name, libs);

        Ok(Self {
            name: recipe.package.name.clone(),
            version: recipe.package.version.clone(),
            package_id: package_id.to_string(),
            shared: options.get("shared").unwrap_or(false),
            libs,
            system_libs,
            frameworks,
            exelinkflags,
            sharedlinkflags,
            include_dirs: vec!["include".to_string()],
            lib_dirs: vec!["lib".to_string()],
            bin_dirs: vec!["bin".to_string()],
        })
    }

    /// Variable prefix used by the CMake generator (`glfw` -> `GLFW`)
    fn variable_prefix(&self) -> String {
        self.name.to_uppercase().replace(['-', '.'], "_")
    }

    fn absolute(package_dir: &Path, dirs: &[String]) -> Vec<String> {
        dirs.iter()
            .map(|d| package_dir.join(d).to_string_lossy().replace('\\', "/"))
            .collect()
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::ParseError(format!("Failed to serialize package info: {}", e)))
    }

    /// Render a CMake script defining `<NAME>_*` variables
    pub fn to_cmake(&self, package_dir: &Path) -> String {
        let prefix = self.variable_prefix();
        let root = package_dir.to_string_lossy().replace('\\', "/");
        let quote = |items: &[String]| {
            items
                .iter()
                .map(|i| format!("\"{}\"", i))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut out = String::new();
        out.push_str(&format!(
            "# {}/{} package {}\n",
            self.name, self.version, self.package_id
        ));
        out.push_str(&format!("set({}_ROOT \"{}\")\n", prefix, root));
        out.push_str(&format!(
            "set({}_INCLUDE_DIRS {})\n",
            prefix,
            quote(&Self::absolute(package_dir, &self.include_dirs))
        ));
        out.push_str(&format!(
            "set({}_LIB_DIRS {})\n",
            prefix,
            quote(&Self::absolute(package_dir, &self.lib_dirs))
        ));
        out.push_str(&format!(
            "set({}_BIN_DIRS {})\n",
            prefix,
            quote(&Self::absolute(package_dir, &self.bin_dirs))
        ));
        out.push_str(&format!("set({}_LIBS {})\n", prefix, self.libs.join(" ")));
        out.push_str(&format!(
            "set({}_EXE_LINKER_FLAGS \"{}\")\n",
            prefix,
            self.exelinkflags.join(" ")
        ));
        out.push_str(&format!(
            "set({}_SHARED_LINKER_FLAGS \"{}\")\n",
            prefix,
            self.sharedlinkflags.join(" ")
        ));
        out
    }

    /// Render `cargo:` directives for a Rust build script
    pub fn to_cargo(&self, package_dir: &Path) -> String {
        let mut out = String::new();
        for dir in Self::absolute(package_dir, &self.lib_dirs) {
            out.push_str(&format!("cargo:rustc-link-search=native={}\n", dir));
        }

        let kind = if self.shared { "dylib" } else { "static" };
        for lib in &self.libs {
            if self.system_libs.contains(lib) {
                out.push_str(&format!("cargo:rustc-link-lib={}\n", lib));
            } else {
                out.push_str(&format!("cargo:rustc-link-lib={}={}\n", kind, lib));
            }
        }
        for framework in &self.frameworks {
            out.push_str(&format!("cargo:rustc-link-lib=framework={}\n", framework));
        }
        out
    }

    /// Write the requested generator outputs into `out_dir`
    pub fn write_generators(
        &self,
        package_dir: &Path,
        out_dir: &Path,
        generators: &[InfoGenerator],
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(out_dir)?;

        let mut written = Vec::new();
        for generator in generators {
            let path = out_dir.join(generator.file_name());
            let content = match generator {
                InfoGenerator::Json => self.to_json()?,
                InfoGenerator::Cmake => self.to_cmake(package_dir),
                InfoGenerator::Cargo => self.to_cargo(package_dir),
            };
            fs::write(&path, content)?;
            info!("Wrote {} metadata: {}", generator, path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Output formats for consumption metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoGenerator {
    Json,
    Cmake,
    Cargo,
}

impl InfoGenerator {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Json => "package_info.json",
            Self::Cmake => "buildinfo.cmake",
            Self::Cargo => "cargo_link.txt",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Cmake => "cmake",
            Self::Cargo => "cargo",
        }
    }
}

impl fmt::Display for InfoGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfoGenerator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "cmake" => Ok(Self::Cmake),
            "cargo" => Ok(Self::Cargo),
            _ => Err(Error::ParseError(format!(
                "unknown generator '{}' (expected json, cmake or cargo)",
                s
            ))),
        }
    }
}

/// Library names found directly under `<package_dir>/lib`
///
/// `libfoo.a`, `libfoo.so` and `libfoo.dylib` yield `foo`; `foo.lib` keeps
/// its stem. The result is sorted and de-duplicated.
pub fn collect_libs(package_dir: &Path) -> Result<Vec<String>> {
    let lib_dir = package_dir.join("lib");
    if !lib_dir.is_dir() {
        debug!("No lib directory in {}", package_dir.display());
        return Ok(Vec::new());
    }

    let mut libs = Vec::new();
    for entry in fs::read_dir(&lib_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) else {
            continue;
        };
        if !LIBRARY_EXTENSIONS.contains(&ext) {
            continue;
        }

        let name = match stem.strip_prefix("lib") {
            Some(rest) if ext != "lib" && !rest.is_empty() => rest,
            _ => stem,
        };
        libs.push(name.to_string());
    }

    libs.sort();
    libs.dedup();
    Ok(libs)
}
