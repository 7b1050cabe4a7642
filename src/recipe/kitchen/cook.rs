// src/recipe/kitchen/cook.rs

//! Cook: the source, build, package and package_info hooks for one variant

use crate::error::{Error, Result};
use crate::recipe::format::{CopyRule, Recipe};
use crate::recipe::package_info::PackageInfo;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::generator::{BuildPlan, BuildStep};
use super::{BuildVariant, Kitchen};

/// Where a cook keeps its sources and build tree
enum WorkDir {
    Temp(TempDir),
    Kept(PathBuf),
}

impl WorkDir {
    fn path(&self) -> &Path {
        match self {
            WorkDir::Temp(dir) => dir.path(),
            WorkDir::Kept(path) => path,
        }
    }
}

/// A single cook operation
pub struct Cook<'a> {
    pub(super) kitchen: &'a Kitchen,
    pub(super) recipe: &'a Recipe,
    pub(super) variant: &'a BuildVariant,
    work: WorkDir,
    /// Install prefix and final package layout
    pub(super) package_dir: PathBuf,
    /// Files copied by the package hook, relative to `package_dir`
    pub(super) packaged: Vec<PathBuf>,
    pub(super) log: String,
    pub(super) warnings: Vec<String>,
}

impl<'a> Cook<'a> {
    pub(super) fn new(
        kitchen: &'a Kitchen,
        recipe: &'a Recipe,
        variant: &'a BuildVariant,
        package_dir: PathBuf,
    ) -> Result<Self> {
        let work = match &kitchen.config.work_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                WorkDir::Kept(std::path::absolute(dir)?)
            }
            None => WorkDir::Temp(TempDir::new().map_err(|e| {
                Error::IoError(format!("Failed to create work directory: {}", e))
            })?),
        };

        Ok(Self {
            kitchen,
            recipe,
            variant,
            work,
            package_dir,
            packaged: Vec::new(),
            log: String::new(),
            warnings: Vec::new(),
        })
    }

    pub(super) fn work_dir(&self) -> &Path {
        self.work.path()
    }

    fn source_dir(&self) -> PathBuf {
        self.work_dir().join(self.recipe.source_folder())
    }

    fn build_dir(&self) -> PathBuf {
        self.work_dir().join(self.recipe.build_folder())
    }

    /// Recipe-side exports staged next to the sources
    fn exports_dir(&self) -> PathBuf {
        self.work_dir().join(format!("{}_exports", self.recipe.name_version()))
    }

    /// Hook 3: fetch, verify, extract and rename the sources; stage exports
    pub(super) fn source(&mut self) -> Result<()> {
        let source_dir = self.kitchen.source(self.recipe, self.work.path())?;
        self.log_line(&format!("Fetched source: {}", self.recipe.archive_url()));
        self.log_line(&format!("Sources in {}", source_dir.display()));

        let exports_dir = self.exports_dir();
        if exports_dir.exists() {
            fs::remove_dir_all(&exports_dir)?;
        }
        if let Some(root) = &self.recipe.export_root {
            for export in &self.recipe.packaging.exports {
                let from = root.join(export);
                if from.is_file() {
                    let to = exports_dir.join(export);
                    if let Some(parent) = to.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::copy(&from, &to)?;
                    debug!("Exported {}", export);
                }
            }
        }

        Ok(())
    }

    /// Hook 4: configure, build and install with the external generator
    pub(super) fn build(&mut self) -> Result<()> {
        let source_dir = self.source_dir();
        let build_dir = self.build_dir();

        if build_dir.exists() {
            fs::remove_dir_all(&build_dir)?;
        }
        fs::create_dir_all(&build_dir)?;
        fs::create_dir_all(&self.package_dir)?;

        let plan = BuildPlan::new(
            self.recipe,
            &self.variant.settings,
            &self.variant.options,
            &source_dir,
            &build_dir,
            &self.package_dir,
            self.kitchen.config.jobs,
        );

        let generator = self.kitchen.generator.clone();
        for step in BuildStep::ALL {
            info!("Running {} {}", generator.name(), step);
            let output = generator.run(step, &plan)?;
            self.log_build_output(step.as_str(), &output.stdout, &output.stderr);
        }

        Ok(())
    }

    /// Hook 5: copy pattern matches and exports into the package directory
    ///
    /// Copy rules search the sources, then the build tree; exports search the
    /// sources, then the recipe-side exports. When flattening maps two files
    /// to one name the later search root wins, so a build artifact beats a
    /// same-named source file and a recipe export beats the upstream copy.
    pub(super) fn package(&mut self) -> Result<()> {
        fs::create_dir_all(&self.package_dir)?;

        let source_dir = self.source_dir();
        let build_dir = self.build_dir();
        let exports_dir = self.exports_dir();

        let copies = self.recipe.packaging.copy.clone();
        for rule in &copies {
            self.copy_rule(rule, &[&source_dir, &build_dir])?;
        }

        let exports: Vec<CopyRule> = self
            .recipe
            .packaging
            .exports
            .iter()
            .map(|export| CopyRule {
                pattern: export.clone(),
                dst: String::new(),
                keep_path: false,
            })
            .collect();
        for rule in &exports {
            self.copy_rule(rule, &[&source_dir, &exports_dir])?;
        }

        Ok(())
    }

    fn copy_rule(&mut self, rule: &CopyRule, roots: &[&Path]) -> Result<()> {
        let mut copied = 0;
        for root in roots {
            copied += self.copy_matching(rule, root)?;
        }
        if copied == 0 {
            debug!("Pattern {} matched no files", rule.pattern);
        } else {
            self.log_line(&format!("Packaged {} file(s) matching {}", copied, rule.pattern));
        }
        Ok(())
    }

    /// Hook 6: resolve the consumption metadata
    pub(super) fn package_info(&mut self) -> Result<PackageInfo> {
        PackageInfo::resolve(
            self.recipe,
            &self.variant.settings,
            &self.variant.options,
            &self.variant.package_id,
            &self.package_dir,
        )
    }

    /// Copy every file under `root` whose name matches the rule
    ///
    /// The package directory is never searched, even when it lies under
    /// `root`.
    fn copy_matching(&mut self, rule: &CopyRule, root: &Path) -> Result<usize> {
        if !root.is_dir() {
            return Ok(0);
        }
        let pattern = glob::Pattern::new(&rule.pattern).map_err(|e| {
            Error::ParseError(format!("Invalid copy pattern '{}': {}", rule.pattern, e))
        })?;
        let dst_root = self.package_dir.join(&rule.dst);
        let package_dir = self.package_dir.clone();

        let mut copied = 0;
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !e.path().starts_with(&package_dir));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !pattern.matches(name) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| Error::IoError(e.to_string()))?;
            let dest = if rule.keep_path {
                dst_root.join(relative)
            } else {
                dst_root.join(entry.file_name())
            };
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest)?;

            let packaged = dest
                .strip_prefix(&self.package_dir)
                .map(Path::to_path_buf)
                .unwrap_or(dest.clone());
            if !self.packaged.contains(&packaged) {
                self.packaged.push(packaged);
            }
            copied += 1;
        }

        Ok(copied)
    }

    pub(super) fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    fn log_build_output(&mut self, phase: &str, stdout: &str, stderr: &str) {
        self.log_line(&format!("=== {} ===", phase));
        if !stdout.is_empty() {
            self.log.push_str(stdout);
            self.log.push('\n');
        }
        if !stderr.is_empty() {
            self.log.push_str(stderr);
            self.log.push('\n');
        }
    }
}
