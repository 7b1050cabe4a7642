// src/recipe/parser.rs

//! Recipe file parsing

use crate::error::{Error, Result};
use crate::recipe::format::Recipe;
use crate::settings::{REMOVABLE_SETTINGS, SETTING_KEYS};
use std::path::Path;

/// The GLFW recipe shipped with this crate
pub const GLFW_RECIPE: &str = include_str!("../../recipes/glfw.toml");

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid recipe: {}", e)))
}

/// Parse a recipe from a file
///
/// The file's directory becomes the recipe's export root.
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read recipe file: {}", e)))?;

    let mut recipe = parse_recipe(&content)?;
    recipe.export_root = path.parent().map(Path::to_path_buf);
    Ok(recipe)
}

/// Parse the built-in GLFW recipe
pub fn builtin_recipe() -> Result<Recipe> {
    parse_recipe(GLFW_RECIPE)
}

/// Validate a recipe for completeness and correctness
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if recipe.package.name.is_empty() {
        return Err(Error::ParseError("Recipe package name cannot be empty".to_string()));
    }
    if recipe.package.version.is_empty() {
        return Err(Error::ParseError("Recipe package version cannot be empty".to_string()));
    }

    recipe.checksum()?;

    if recipe.archive_url().contains("%(") {
        return Err(Error::ParseError(format!(
            "Unresolved variable in archive URL: {}",
            recipe.archive_url()
        )));
    }

    for key in &recipe.settings.ignore {
        if !SETTING_KEYS.contains(&key.as_str()) {
            return Err(Error::ParseError(format!("Unknown setting to ignore: {}", key)));
        }
        if !REMOVABLE_SETTINGS.contains(&key.as_str()) {
            return Err(Error::ParseError(format!(
                "Setting '{}' cannot be ignored (only {})",
                key,
                REMOVABLE_SETTINGS.join(", ")
            )));
        }
    }

    for name in recipe.options.unsupported.keys() {
        if !recipe.options.defaults.contains_key(name) {
            return Err(Error::ParseError(format!(
                "Option '{}' is marked unsupported but never declared",
                name
            )));
        }
    }

    for rule in &recipe.packaging.copy {
        if let Err(e) = glob::Pattern::new(&rule.pattern) {
            return Err(Error::ParseError(format!(
                "Invalid copy pattern '{}': {}",
                rule.pattern, e
            )));
        }
    }

    if recipe.package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if recipe.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if recipe.package.homepage.is_none() {
        warnings.push("Missing package homepage".to_string());
    }

    Ok(warnings)
}
