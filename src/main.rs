// src/main.rs

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glfw_recipe::recipe::{builtin_recipe, parse_recipe_file, validate_recipe, InfoGenerator};
use glfw_recipe::{Kitchen, KitchenConfig, OperatingSystem, Profile, Recipe, Settings};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "glfw-recipe")]
#[command(author, version, about = "Build GLFW from source and publish its link metadata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Recipe, profile and overrides shared by every subcommand
#[derive(Args)]
struct VariantArgs {
    /// Recipe file (defaults to the built-in GLFW recipe)
    #[arg(long)]
    recipe: Option<PathBuf>,

    /// Profile file with settings and option values
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Setting override, e.g. `-s os=Windows`
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
    settings: Vec<String>,

    /// Option override, e.g. `-o shared=True`
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    options: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, build and package the recipe
    Cook {
        #[command(flatten)]
        variant: VariantArgs,

        /// Directory the package directory is created in
        #[arg(long, default_value = ".")]
        output: PathBuf,

        /// Keep sources and build tree in this directory
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Source archive cache
        #[arg(long)]
        source_cache: Option<PathBuf>,

        /// Parallel build jobs
        #[arg(short, long)]
        jobs: Option<u32>,

        /// Metadata generators: json, cmake, cargo
        #[arg(short = 'g', long = "generator")]
        generators: Vec<InfoGenerator>,

        /// Disable download progress bars
        #[arg(long)]
        no_progress: bool,

        /// cmake executable to run
        #[arg(long, value_name = "PATH")]
        cmake: Option<PathBuf>,

        /// CMake generator, e.g. `Ninja`
        #[arg(short = 'G', long = "cmake-generator", value_name = "NAME")]
        cmake_generator: Option<String>,
    },
    /// Fetch and extract the sources only
    Source {
        /// Recipe file (defaults to the built-in GLFW recipe)
        #[arg(long)]
        recipe: Option<PathBuf>,

        /// Directory to extract into
        #[arg(long, default_value = ".")]
        dest: PathBuf,

        /// Source archive cache
        #[arg(long)]
        source_cache: Option<PathBuf>,
    },
    /// Show the recipe's identity, options and link table for an OS
    Info {
        /// Recipe file (defaults to the built-in GLFW recipe)
        #[arg(long)]
        recipe: Option<PathBuf>,

        /// Target OS (defaults to the host)
        #[arg(long)]
        os: Option<OperatingSystem>,
    },
    /// Print the package id for a profile and overrides
    PackageId {
        #[command(flatten)]
        variant: VariantArgs,
    },
}

fn load_recipe(path: Option<&Path>) -> Result<Recipe> {
    let recipe = match path {
        Some(path) => parse_recipe_file(path)
            .with_context(|| format!("Failed to load recipe {}", path.display()))?,
        None => builtin_recipe().context("Built-in recipe is invalid")?,
    };
    for warning in validate_recipe(&recipe)? {
        warn!("{}", warning);
    }
    Ok(recipe)
}

fn load_profile(path: Option<&Path>) -> Result<Profile> {
    match path {
        Some(path) => Profile::load(path)
            .with_context(|| format!("Failed to load profile {}", path.display())),
        None => Ok(Profile::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cook {
            variant,
            output,
            work_dir,
            source_cache,
            jobs,
            generators,
            no_progress,
            cmake,
            cmake_generator,
        } => {
            let recipe = load_recipe(variant.recipe.as_deref())?;
            let profile = load_profile(variant.profile.as_deref())?;

            let mut config = KitchenConfig {
                work_dir,
                show_progress: !no_progress,
                cmake_program: cmake,
                cmake_generator,
                ..Default::default()
            };
            if let Some(cache) = source_cache {
                config.source_cache = cache;
            }
            if let Some(jobs) = jobs {
                config.jobs = jobs;
            }
            if !generators.is_empty() {
                config.generators = generators;
            }

            let kitchen = Kitchen::new(config)?;
            let build_variant =
                kitchen.configure(&recipe, &profile, &variant.settings, &variant.options)?;
            let result = kitchen
                .cook(&recipe, &build_variant, &output)
                .with_context(|| format!("Failed to cook {}", recipe.name_version()))?;

            for warning in &result.warnings {
                warn!("{}", warning);
            }
            println!("Package: {}", result.package_dir.display());
            println!("Package id: {}", result.package_id);
            println!("Libs: {}", result.package_info.libs.join(", "));
            for path in &result.generated {
                println!("Generated: {}", path.display());
            }
            Ok(())
        }
        Commands::Source {
            recipe,
            dest,
            source_cache,
        } => {
            let recipe = load_recipe(recipe.as_deref())?;
            let mut config = KitchenConfig::default();
            if let Some(cache) = source_cache {
                config.source_cache = cache;
            }

            let kitchen = Kitchen::new(config)?;
            std::fs::create_dir_all(&dest)?;
            let source_dir = kitchen.source(&recipe, &dest)?;
            info!("Sources extracted to {}", source_dir.display());
            println!("{}", source_dir.display());
            Ok(())
        }
        Commands::Info { recipe, os } => {
            let recipe = load_recipe(recipe.as_deref())?;
            let os = match os {
                Some(os) => os,
                None => OperatingSystem::host()?,
            };

            let settings = Settings::for_os(os);
            let mut options = recipe.default_options();
            recipe.config_options(&settings, &mut options);

            println!("{}/{}", recipe.package.name, recipe.package.version);
            if let Some(description) = &recipe.package.description {
                println!("Description: {}", description);
            }
            if let Some(license) = &recipe.package.license {
                println!("License: {}", license);
            }
            println!("OS: {}", os);
            println!("Options: {}", options);
            println!("Source: {}", recipe.archive_url());
            println!("Sources folder: {}", recipe.source_folder());
            println!("Build folder: {}", recipe.build_folder());

            match recipe.platform_linkage(os) {
                Some(linkage) => {
                    if !linkage.system_libs.is_empty() {
                        println!("System libs: {}", linkage.system_libs.join(" "));
                    }
                    if let Some(flags) = linkage.framework_flags() {
                        println!("Linker flags: {}", flags);
                    }
                }
                None => println!("No extra link requirements"),
            }
            Ok(())
        }
        Commands::PackageId { variant } => {
            let recipe = load_recipe(variant.recipe.as_deref())?;
            let profile = load_profile(variant.profile.as_deref())?;

            // Only the configure hooks run; nothing is fetched.
            let kitchen = Kitchen::new(KitchenConfig::default())?;
            let build_variant =
                kitchen.configure(&recipe, &profile, &variant.settings, &variant.options)?;
            for warning in &build_variant.warnings {
                warn!("{}", warning);
            }
            println!("{}", build_variant.package_id);
            Ok(())
        }
    }
}
