// src/lib.rs

//! GLFW recipe
//!
//! Builds GLFW 3.3.2 from its upstream source release with CMake and
//! publishes the link metadata a consumer needs for each target OS.
//!
//! # Layout
//!
//! - [`settings`] and [`options`]: the inputs that select a binary variant
//! - [`profile`]: TOML files bundling settings and option values
//! - [`recipe`]: the recipe format, package ids and the cooking lifecycle
//! - [`hash`]: source checksums

mod error;
pub mod hash;
pub mod options;
pub mod profile;
pub mod recipe;
pub mod settings;

pub use error::{Error, Result};
pub use hash::{Hash, HashAlgorithm, Hasher};
pub use options::OptionSet;
pub use profile::Profile;
pub use recipe::{BuildVariant, Cook, CookResult, Kitchen, KitchenConfig, PackageInfo, Recipe};
pub use settings::{Arch, BuildType, Compiler, OperatingSystem, Settings};
