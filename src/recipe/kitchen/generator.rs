// src/recipe/kitchen/generator.rs

//! External build generator invocation
//!
//! The recipe never compiles anything itself; it hands a [`BuildPlan`] to a
//! [`BuildGenerator`] and runs the configure, build and install steps in
//! order. [`CMake`] is the real implementation.

use crate::error::{Error, Result};
use crate::options::OptionSet;
use crate::recipe::format::Recipe;
use crate::settings::{BuildType, Settings};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::config::KitchenConfig;

/// One step of the configure, build, install pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Configure,
    Build,
    Install,
}

impl BuildStep {
    pub const ALL: [BuildStep; 3] = [Self::Configure, Self::Build, Self::Install];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the generator needs to build one variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub install_prefix: PathBuf,
    pub build_type: BuildType,
    /// Cache definitions, sorted by name
    pub definitions: BTreeMap<String, String>,
    pub jobs: u32,
}

impl BuildPlan {
    /// Derive the plan from the recipe and the configured settings/options
    ///
    /// `shared` maps to `BUILD_SHARED_LIBS` and `fPIC` to
    /// `CMAKE_POSITION_INDEPENDENT_CODE`, each only while the option exists.
    pub fn new(
        recipe: &Recipe,
        settings: &Settings,
        options: &OptionSet,
        source_dir: &Path,
        build_dir: &Path,
        install_prefix: &Path,
        jobs: u32,
    ) -> Self {
        let mut definitions: BTreeMap<String, String> = recipe
            .build
            .definitions
            .iter()
            .map(|(k, v)| (k.clone(), v.to_cmake()))
            .collect();

        let on_off = |v: bool| if v { "ON" } else { "OFF" }.to_string();

        definitions.insert(
            "CMAKE_BUILD_TYPE".to_string(),
            settings.build_type.to_string(),
        );
        definitions.insert(
            "CMAKE_INSTALL_PREFIX".to_string(),
            install_prefix.to_string_lossy().to_string(),
        );
        if let Some(shared) = options.get("shared") {
            definitions.insert("BUILD_SHARED_LIBS".to_string(), on_off(shared));
        }
        if let Some(fpic) = options.get("fPIC") {
            definitions.insert("CMAKE_POSITION_INDEPENDENT_CODE".to_string(), on_off(fpic));
        }

        Self {
            source_dir: source_dir.to_path_buf(),
            build_dir: build_dir.to_path_buf(),
            install_prefix: install_prefix.to_path_buf(),
            build_type: settings.build_type,
            definitions,
            jobs: recipe.build.jobs.unwrap_or(jobs).max(1),
        }
    }
}

/// Captured output of a successful step
#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    pub stdout: String,
    pub stderr: String,
}

/// An external multi-platform build generator
pub trait BuildGenerator: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Run one step; a non-zero exit is `Error::BuildError`
    fn run(&self, step: BuildStep, plan: &BuildPlan) -> Result<StepOutput>;
}

/// CMake driven through its command-line interface
#[derive(Debug, Clone)]
pub struct CMake {
    program: PathBuf,
    /// Value for `-G`; CMake's platform default when unset
    generator: Option<String>,
}

impl Default for CMake {
    fn default() -> Self {
        Self {
            program: PathBuf::from("cmake"),
            generator: None,
        }
    }
}

impl CMake {
    pub fn new() -> Self {
        Self::default()
    }

    /// CMake as selected by a kitchen configuration
    pub fn from_config(config: &KitchenConfig) -> Self {
        let mut cmake = Self::new();
        if let Some(program) = &config.cmake_program {
            cmake = cmake.with_program(program.clone());
        }
        if let Some(generator) = &config.cmake_generator {
            cmake = cmake.with_generator(generator.clone());
        }
        cmake
    }

    /// Use a specific cmake executable
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Select a CMake generator, e.g. `Ninja`
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    /// Command-line arguments for a step
    pub fn args(&self, step: BuildStep, plan: &BuildPlan) -> Vec<String> {
        let mut args = Vec::new();
        match step {
            BuildStep::Configure => {
                args.push("-S".to_string());
                args.push(plan.source_dir.to_string_lossy().to_string());
                args.push("-B".to_string());
                args.push(plan.build_dir.to_string_lossy().to_string());
                if let Some(generator) = &self.generator {
                    args.push("-G".to_string());
                    args.push(generator.clone());
                }
                for (name, value) in &plan.definitions {
                    args.push(format!("-D{}={}", name, value));
                }
            }
            BuildStep::Build => {
                args.push("--build".to_string());
                args.push(plan.build_dir.to_string_lossy().to_string());
                args.push("--config".to_string());
                args.push(plan.build_type.to_string());
                args.push("--parallel".to_string());
                args.push(plan.jobs.to_string());
            }
            BuildStep::Install => {
                args.push("--install".to_string());
                args.push(plan.build_dir.to_string_lossy().to_string());
                args.push("--config".to_string());
                args.push(plan.build_type.to_string());
            }
        }
        args
    }

    fn resolve_program(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|e| {
            Error::NotFound(format!("{} not found: {}", self.program.display(), e))
        })
    }
}

impl BuildGenerator for CMake {
    fn name(&self) -> &str {
        "cmake"
    }

    fn run(&self, step: BuildStep, plan: &BuildPlan) -> Result<StepOutput> {
        let program = self.resolve_program()?;
        let args = self.args(step, plan);
        debug!("{} {}", program.display(), args.join(" "));

        let output = Command::new(&program)
            .args(&args)
            .output()
            .map_err(|e| Error::BuildError {
                phase: step.to_string(),
                message: format!("failed to run {}: {}", program.display(), e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(Error::BuildError {
                phase: step.to_string(),
                message: format!("exit code {:?}\nstderr: {}", output.status.code(), stderr),
            });
        }

        Ok(StepOutput { stdout, stderr })
    }
}
