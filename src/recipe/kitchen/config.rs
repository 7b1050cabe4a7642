// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::recipe::package_info::{InfoGenerator, PackageInfo};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the Kitchen
#[derive(Debug, Clone)]
pub struct KitchenConfig {
    /// Directory for downloaded source archives, keyed by checksum
    pub source_cache: PathBuf,
    /// Number of parallel build jobs
    pub jobs: u32,
    /// Persistent work directory; a temporary one is used when unset
    pub work_dir: Option<PathBuf>,
    /// Timeout for each HTTP request
    pub http_timeout: Duration,
    /// Download attempts before giving up
    pub max_retries: u32,
    /// Show download progress bars
    pub show_progress: bool,
    /// Metadata files written next to the package
    pub generators: Vec<InfoGenerator>,
    /// cmake executable; looked up on `PATH` when unset
    pub cmake_program: Option<PathBuf>,
    /// CMake generator passed as `-G`, e.g. `Ninja`
    pub cmake_generator: Option<String>,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        let source_cache = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("glfw-recipe")
            .join("sources");

        Self {
            source_cache,
            jobs,
            work_dir: None,
            http_timeout: Duration::from_secs(300),
            max_retries: 3,
            show_progress: true,
            generators: vec![InfoGenerator::Json],
            cmake_program: None,
            cmake_generator: None,
        }
    }
}

/// Result of cooking a recipe
#[derive(Debug)]
pub struct CookResult {
    /// Directory holding the packaged files
    pub package_dir: PathBuf,
    pub package_id: String,
    /// Published consumption metadata
    pub package_info: PackageInfo,
    /// Metadata files written by the generators
    pub generated: Vec<PathBuf>,
    /// Files copied by the package hook, relative to `package_dir`
    pub packaged_files: Vec<PathBuf>,
    /// Build log
    pub log: String,
    /// Warnings generated during the cook
    pub warnings: Vec<String>,
}
