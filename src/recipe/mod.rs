// src/recipe/mod.rs

//! Recipes for building upstream libraries from source
//!
//! A recipe pins one upstream release and describes:
//! - The source archive and its checksum
//! - Options and settings the build reacts to
//! - How the external build generator is driven
//! - Extra files to package and the link metadata consumers need
//!
//! The vocabulary follows the kitchen: a **Recipe** is the build card,
//! the **Kitchen** is where it runs, and a **Cook** is one run of it.

pub mod format;
pub mod kitchen;
pub mod package_id;
pub mod package_info;
pub mod parser;

pub use format::{CopyRule, Definition, PlatformLinkage, Recipe};
pub use kitchen::{BuildVariant, Cook, CookResult, Kitchen, KitchenConfig};
pub use package_id::package_id;
pub use package_info::{InfoGenerator, PackageInfo};
pub use parser::{builtin_recipe, parse_recipe, parse_recipe_file, validate_recipe};
