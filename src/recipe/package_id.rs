// src/recipe/package_id.rs

//! Package ids: one hash per binary variant
//!
//! The id covers the recipe identity, every setting still present after the
//! `configure` hook and every option still present after `config_options`.
//! Settings the recipe ignores therefore never split binaries.

use crate::hash::{hash_bytes, HashAlgorithm};
use crate::options::OptionSet;
use crate::recipe::format::Recipe;
use crate::settings::Settings;

/// Canonical text the package id is computed from
pub fn package_id_input(recipe: &Recipe, settings: &Settings, options: &OptionSet) -> String {
    let mut data = String::new();

    data.push_str(&format!("{}/{}\n", recipe.package.name, recipe.package.version));

    data.push_str("[settings]\n");
    for (key, value) in settings.entries() {
        data.push_str(&format!("{}={}\n", key, value));
    }

    data.push_str("[options]\n");
    for (name, value) in options.iter() {
        data.push_str(&format!("{}={}\n", name, if value { "True" } else { "False" }));
    }

    data
}

/// SHA-256 package id
pub fn package_id(recipe: &Recipe, settings: &Settings, options: &OptionSet) -> String {
    let input = package_id_input(recipe, settings, options);
    hash_bytes(HashAlgorithm::Sha256, input.as_bytes()).value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parser::builtin_recipe;
    use crate::settings::OperatingSystem;

    fn configured(os: OperatingSystem, libcxx: &str) -> (Recipe, Settings, OptionSet) {
        let recipe = builtin_recipe().unwrap();
        let mut settings = Settings::for_os(os);
        settings.set("compiler.libcxx", libcxx).unwrap();
        let mut options = recipe.default_options();
        recipe.config_options(&settings, &mut options);
        recipe.configure(&mut settings).unwrap();
        (recipe, settings, options)
    }

    #[test]
    fn test_package_id_deterministic() {
        let (recipe, settings, options) = configured(OperatingSystem::Linux, "libstdc++11");
        let a = package_id(&recipe, &settings, &options);
        let b = package_id(&recipe, &settings, &options);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_package_id_ignores_libcxx() {
        let (recipe, s1, o1) = configured(OperatingSystem::Linux, "libstdc++");
        let (_, s2, o2) = configured(OperatingSystem::Linux, "libc++");
        assert_eq!(package_id(&recipe, &s1, &o1), package_id(&recipe, &s2, &o2));
    }

    #[test]
    fn test_package_id_changes_with_os_and_options() {
        let (recipe, settings, options) = configured(OperatingSystem::Linux, "libstdc++11");
        let base = package_id(&recipe, &settings, &options);

        let (_, win_settings, win_options) = configured(OperatingSystem::Windows, "x");
        assert_ne!(base, package_id(&recipe, &win_settings, &win_options));

        let mut shared = options.clone();
        shared.set("shared", true).unwrap();
        assert_ne!(base, package_id(&recipe, &settings, &shared));
    }

    #[test]
    fn test_package_id_input_layout() {
        let (recipe, settings, options) = configured(OperatingSystem::Windows, "x");
        let input = package_id_input(&recipe, &settings, &options);
        assert!(input.starts_with("glfw/3.3.2\n[settings]\n"));
        assert!(input.contains("os=Windows\n"));
        assert!(input.ends_with("[options]\nshared=False\n"));
        assert!(!input.contains("libcxx"));
    }
}
