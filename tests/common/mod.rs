// tests/common/mod.rs

//! Shared fixtures for the cooking integration tests.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use glfw_recipe::hash::{hash_bytes, HashAlgorithm};
use glfw_recipe::recipe::builtin_recipe;
use glfw_recipe::recipe::kitchen::{
    BuildGenerator, BuildPlan, BuildStep, SourceFetcher, StepOutput,
};
use glfw_recipe::{Error, Kitchen, KitchenConfig, Recipe, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Build a gzipped tarball in memory
pub fn tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// A small stand-in for the upstream glfw-3.3.2 release archive
pub fn glfw_archive() -> Vec<u8> {
    tar_gz(&[
        ("glfw-3.3.2/CMakeLists.txt", b"project(GLFW VERSION 3.3.2 LANGUAGES C)\n"),
        ("glfw-3.3.2/LICENSE.md", b"Copyright (c) 2002-2006 Marcus Geelnard\n"),
        ("glfw-3.3.2/include/GLFW/glfw3.h", b"#define GLFW_VERSION_MAJOR 3\n"),
        ("glfw-3.3.2/src/window.c", b"int glfwInit(void) { return 1; }\n"),
    ])
}

/// The built-in recipe with its checksum pointed at `archive`
pub fn recipe_for(archive: &[u8]) -> Recipe {
    let mut recipe = builtin_recipe().unwrap();
    recipe.source.checksum = hash_bytes(HashAlgorithm::Sha256, archive).to_prefixed_string();
    recipe
}

/// Serves a fixed archive for every URL and records what was asked for
pub struct FixtureFetcher {
    archive: Vec<u8>,
    pub urls: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl FixtureFetcher {
    pub fn new(archive: Vec<u8>) -> Self {
        Self {
            archive,
            urls: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SourceFetcher for FixtureFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        fs::write(dest, &self.archive)?;
        Ok(())
    }
}

/// Fake generator that records each step and lays out a plausible install
///
/// Install writes `lib/libglfw3.a` and `include/GLFW/glfw3.h` under the
/// install prefix; build drops a `glfw.pdb` deep in the build tree.
#[derive(Default)]
pub struct RecordingGenerator {
    pub steps: Mutex<Vec<BuildStep>>,
    pub plans: Mutex<Vec<BuildPlan>>,
    pub fail_on: Option<BuildStep>,
}

impl RecordingGenerator {
    pub fn failing_on(step: BuildStep) -> Self {
        Self {
            fail_on: Some(step),
            ..Default::default()
        }
    }

    pub fn steps(&self) -> Vec<BuildStep> {
        self.steps.lock().unwrap().clone()
    }

    pub fn last_plan(&self) -> Option<BuildPlan> {
        self.plans.lock().unwrap().last().cloned()
    }
}

impl BuildGenerator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    fn run(&self, step: BuildStep, plan: &BuildPlan) -> Result<StepOutput> {
        self.steps.lock().unwrap().push(step);
        self.plans.lock().unwrap().push(plan.clone());

        if self.fail_on == Some(step) {
            return Err(Error::BuildError {
                phase: step.to_string(),
                message: "exit code Some(2)".to_string(),
            });
        }

        match step {
            BuildStep::Configure => {
                assert!(plan.source_dir.join("CMakeLists.txt").is_file());
                fs::write(plan.build_dir.join("CMakeCache.txt"), "CMAKE_BUILD_TYPE=Release\n")?;
            }
            BuildStep::Build => {
                let pdb_dir = plan.build_dir.join("src").join("Release");
                fs::create_dir_all(&pdb_dir)?;
                fs::write(pdb_dir.join("glfw.pdb"), b"pdb")?;
            }
            BuildStep::Install => {
                let lib = plan.install_prefix.join("lib");
                let include = plan.install_prefix.join("include").join("GLFW");
                fs::create_dir_all(&lib)?;
                fs::create_dir_all(&include)?;
                fs::write(lib.join("libglfw3.a"), b"!<arch>\n")?;
                fs::write(include.join("glfw3.h"), b"#define GLFW_VERSION_MAJOR 3\n")?;
            }
        }

        Ok(StepOutput {
            stdout: format!("-- {} done", step),
            stderr: String::new(),
        })
    }
}

/// A kitchen wired to fixtures, with its cache and work dir in a temp dir
pub struct TestKitchen {
    pub kitchen: Kitchen,
    pub fetcher: Arc<FixtureFetcher>,
    pub generator: Arc<RecordingGenerator>,
    pub root: TempDir,
}

impl TestKitchen {
    pub fn new(archive: Vec<u8>, generator: RecordingGenerator) -> Self {
        let root = tempfile::tempdir().unwrap();
        let config = KitchenConfig {
            source_cache: root.path().join("cache"),
            work_dir: Some(root.path().join("work")),
            jobs: 2,
            show_progress: false,
            ..Default::default()
        };
        let fetcher = Arc::new(FixtureFetcher::new(archive));
        let generator = Arc::new(generator);
        let kitchen = Kitchen::with_tools(config, fetcher.clone(), generator.clone());
        Self {
            kitchen,
            fetcher,
            generator,
            root,
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.path().join("work")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.path().join("out")
    }
}
