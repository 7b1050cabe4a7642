// src/recipe/kitchen/mod.rs

//! Kitchen: drives a recipe through its lifecycle
//!
//! A cook runs the recipe hooks in a fixed order:
//! 1. `config_options` removes options that do not exist on the target OS
//! 2. `configure` discards settings the binary is insensitive to
//! 3. `source` fetches, verifies, extracts and renames the upstream archive
//! 4. `build` drives the external generator (configure, build, install)
//! 5. `package` copies extra files into the package directory
//! 6. `package_info` publishes link metadata for consumers
//!
//! The first two hooks happen in [`Kitchen::configure`], which yields a
//! [`BuildVariant`] with its package id; [`Kitchen::cook`] runs the rest.

mod archive;
mod config;
mod cook;
pub mod generator;

pub use archive::{extract_archive, verify_file_checksum, HttpFetcher, SourceFetcher};
pub use config::{CookResult, KitchenConfig};
pub use cook::Cook;
pub use generator::{BuildGenerator, BuildPlan, BuildStep, CMake, StepOutput};

use crate::error::{Error, Result};
use crate::hash::{hash_file, Hash};
use crate::options::OptionSet;
use crate::profile::Profile;
use crate::recipe::format::Recipe;
use crate::recipe::package_id::package_id;
use crate::settings::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings and options after `config_options` and `configure`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildVariant {
    pub settings: Settings,
    pub options: OptionSet,
    /// Digest of the effective settings and options
    pub package_id: String,
    /// Profile values that were skipped
    pub warnings: Vec<String>,
}

impl BuildVariant {
    /// Directory name for this variant's package
    pub fn package_dir_name(&self, recipe: &Recipe) -> String {
        let short = &self.package_id[..16.min(self.package_id.len())];
        format!("{}-{}", recipe.name_version(), short)
    }
}

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    fetcher: Arc<dyn SourceFetcher>,
    generator: Arc<dyn BuildGenerator>,
}

impl Kitchen {
    /// Create a Kitchen that downloads over HTTP and builds with CMake
    pub fn new(config: KitchenConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(
            config.http_timeout,
            config.max_retries,
            config.show_progress,
        )?;
        let cmake = CMake::from_config(&config);
        Ok(Self::with_tools(config, Arc::new(fetcher), Arc::new(cmake)))
    }

    /// Create a Kitchen with explicit fetcher and generator
    pub fn with_tools(
        config: KitchenConfig,
        fetcher: Arc<dyn SourceFetcher>,
        generator: Arc<dyn BuildGenerator>,
    ) -> Self {
        Self {
            config,
            fetcher,
            generator,
        }
    }

    /// Create a Kitchen with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(KitchenConfig::default())
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Run `config_options` and `configure` for a profile
    ///
    /// `setting_overrides` and `option_overrides` are `key=value` strings
    /// applied after the profile. An override naming an option that does not
    /// exist for the target OS is an error.
    pub fn configure(
        &self,
        recipe: &Recipe,
        profile: &Profile,
        setting_overrides: &[String],
        option_overrides: &[String],
    ) -> Result<BuildVariant> {
        let mut settings = profile.resolve_settings()?;
        for assignment in setting_overrides {
            settings.apply_override(assignment)?;
        }

        let mut options = recipe.default_options();
        recipe.config_options(&settings, &mut options);

        let warnings = profile.apply_options(&mut options, &recipe.options.defaults)?;
        for assignment in option_overrides {
            options.apply_override(assignment)?;
        }

        recipe.configure(&mut settings)?;

        let package_id = package_id(recipe, &settings, &options);
        debug!("Package id for {}: {}", recipe.name_version(), package_id);

        Ok(BuildVariant {
            settings,
            options,
            package_id,
            warnings,
        })
    }

    /// Cook a configured variant into `output_dir`
    ///
    /// The package lands in `output_dir/{name}-{version}-{id prefix}`; any
    /// previous contents are replaced.
    pub fn cook(
        &self,
        recipe: &Recipe,
        variant: &BuildVariant,
        output_dir: &Path,
    ) -> Result<CookResult> {
        info!(
            "Cooking {} for {} ({})",
            recipe.name_version(),
            variant.settings.os,
            variant.options
        );

        let output_dir = std::path::absolute(output_dir)?;
        let package_dir = output_dir.join(variant.package_dir_name(recipe));

        let mut cook = Cook::new(self, recipe, variant, package_dir.clone())?;
        cook.warnings.extend(variant.warnings.iter().cloned());
        debug!("Work directory: {}", cook.work_dir().display());

        info!("Source: fetching {}...", recipe.archive_url());
        cook.source()?;

        // A previous package of this variant survives until the sources verify
        if package_dir.exists() {
            fs::remove_dir_all(&package_dir)?;
        }
        fs::create_dir_all(&package_dir)?;

        info!("Build: running {}...", self.generator.name());
        cook.build()?;

        info!("Package: collecting extra files...");
        cook.package()?;

        info!("Package info: resolving link metadata...");
        let package_info = cook.package_info()?;

        let generated =
            package_info.write_generators(&package_dir, &package_dir, &self.config.generators)?;

        info!("Cooked {} into {}", recipe.name_version(), package_dir.display());

        Ok(CookResult {
            package_dir,
            package_id: variant.package_id.clone(),
            package_info,
            generated,
            packaged_files: cook.packaged.clone(),
            log: cook.log.clone(),
            warnings: cook.warnings.clone(),
        })
    }

    /// Configure with a profile and cook in one go
    pub fn cook_profile(
        &self,
        recipe: &Recipe,
        profile: &Profile,
        output_dir: &Path,
    ) -> Result<CookResult> {
        let variant = self.configure(recipe, profile, &[], &[])?;
        self.cook(recipe, &variant, output_dir)
    }

    /// Download and verify the source archive, returning its cached path
    pub fn fetch(&self, recipe: &Recipe) -> Result<PathBuf> {
        let checksum = recipe.checksum()?;
        self.fetch_source(&recipe.archive_url(), &checksum, &recipe.archive_filename())
    }

    /// Fetch and extract the sources into `dest/{name}-{version}_sources`
    ///
    /// An existing sources folder is replaced. Nothing is extracted when the
    /// checksum does not match.
    pub fn source(&self, recipe: &Recipe, dest: &Path) -> Result<PathBuf> {
        let archive = self.fetch(recipe)?;

        let staging = dest.join(format!(".{}-extract", recipe.name_version()));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        extract_archive(&archive, &staging)?;

        let extracted = staging.join(recipe.extracted_dir());
        if !extracted.is_dir() {
            fs::remove_dir_all(&staging)?;
            return Err(Error::NotFound(format!(
                "Archive {} has no top-level directory {}",
                recipe.archive_filename(),
                recipe.extracted_dir()
            )));
        }

        let source_dir = dest.join(recipe.source_folder());
        if source_dir.exists() {
            fs::remove_dir_all(&source_dir)?;
        }
        fs::rename(&extracted, &source_dir)?;
        fs::remove_dir_all(&staging)?;

        debug!("Sources ready in {}", source_dir.display());
        Ok(source_dir)
    }

    /// Fetch a source archive into the checksum-keyed cache
    ///
    /// The archive is stored as `{cache}/{algo}_{hex}/{filename}` so its
    /// extension still names the archive format.
    pub(crate) fn fetch_source(
        &self,
        url: &str,
        checksum: &Hash,
        filename: &str,
    ) -> Result<PathBuf> {
        let cache_key = checksum.to_prefixed_string().replace(':', "_");
        let entry_dir = self.config.source_cache.join(&cache_key);
        let cached_path = entry_dir.join(filename);

        if cached_path.exists() {
            debug!("Using cached source: {}", cached_path.display());
            if verify_file_checksum(&cached_path, checksum)? {
                return Ok(cached_path);
            }
            warn!("Cached file checksum mismatch, re-downloading");
            fs::remove_file(&cached_path)?;
        }
        fs::create_dir_all(&entry_dir)?;

        info!("Downloading: {}", url);
        let temp_path = entry_dir.join(format!("{}.tmp", filename));
        if let Err(e) = self.fetcher.fetch(url, &temp_path) {
            discard_download(&temp_path, &entry_dir);
            return Err(e);
        }

        let actual = hash_file(&temp_path, checksum.algorithm)?;
        if actual.as_str() != checksum.as_str() {
            discard_download(&temp_path, &entry_dir);
            return Err(Error::ChecksumMismatch {
                expected: checksum.to_prefixed_string(),
                actual: actual.to_prefixed_string(),
            });
        }

        fs::rename(&temp_path, &cached_path)?;
        Ok(cached_path)
    }
}

/// Remove a partial download and its cache entry directory if now empty
fn discard_download(temp_path: &Path, entry_dir: &Path) {
    if temp_path.exists() {
        if let Err(e) = fs::remove_file(temp_path) {
            warn!("Failed to remove {}: {}", temp_path.display(), e);
        }
    }
    // Fails harmlessly when another archive still lives there
    let _ = fs::remove_dir(entry_dir);
}
