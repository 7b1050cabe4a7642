// tests/cook.rs

//! End-to-end cooking tests with a fixture archive and a fake generator.

mod common;

use common::{glfw_archive, recipe_for, RecordingGenerator, TestKitchen};
use glfw_recipe::recipe::kitchen::{BuildGenerator, BuildPlan, BuildStep, StepOutput};
use glfw_recipe::recipe::parser::GLFW_RECIPE;
use glfw_recipe::recipe::{parse_recipe_file, InfoGenerator};
use glfw_recipe::{Error, OperatingSystem, Profile};
use std::fs;

#[test]
fn test_cook_linux_layout() {
    let archive = glfw_archive();
    let recipe = recipe_for(&archive);
    let tk = TestKitchen::new(archive, RecordingGenerator::default());

    let result = tk
        .kitchen
        .cook_profile(&recipe, &Profile::for_os(OperatingSystem::Linux), &tk.output_dir())
        .unwrap();

    assert_eq!(
        tk.generator.steps(),
        vec![BuildStep::Configure, BuildStep::Build, BuildStep::Install]
    );
    assert_eq!(
        tk.fetcher.urls.lock().unwrap().as_slice(),
        ["https://github.com/glfw/glfw/archive/3.3.2.tar.gz"]
    );

    let work = tk.work_dir();
    assert!(work.join("glfw-3.3.2_sources/CMakeLists.txt").is_file());
    assert!(work.join("glfw-3.3.2_build/CMakeCache.txt").is_file());
    assert!(!work.join("glfw-3.3.2").exists());

    let pkg = &result.package_dir;
    assert!(pkg.starts_with(tk.output_dir()));
    assert!(pkg.join("lib/libglfw3.a").is_file());
    assert!(pkg.join("include/GLFW/glfw3.h").is_file());
    assert!(pkg.join("bin/glfw.pdb").is_file());
    assert!(!pkg.join("bin/src").exists());
    assert!(pkg.join("LICENSE.md").is_file());
    assert!(pkg.join("package_info.json").is_file());

    let plan = tk.generator.last_plan().unwrap();
    assert_eq!(plan.install_prefix, *pkg);
    assert_eq!(plan.definitions["GLFW_BUILD_EXAMPLES"], "OFF");
    assert_eq!(plan.definitions["CMAKE_POSITION_INDEPENDENT_CODE"], "ON");
}

#[test]
fn test_cook_linux_libs() {
    let archive = glfw_archive();
    let recipe = recipe_for(&archive);
    let tk = TestKitchen::new(archive, RecordingGenerator::default());

    let info = tk
        .kitchen
        .cook_profile(&recipe, &Profile::for_os(OperatingSystem::Linux), &tk.output_dir())
        .unwrap()
        .package_info;

    let expected = [
        "glfw3", "Xrandr", "Xrender", "Xi", "Xinerama", "Xcursor", "GL", "m", "dl", "drm",
        "Xdamage", "X11-xcb", "xcb-glx", "xcb-dri2", "xcb-dri3", "xcb-present", "xcb-sync",
        "Xxf86vm", "Xfixes", "Xext", "X11", "pthread", "xcb", "Xau",
    ];
    assert_eq!(info.libs, expected);
    assert!(info.exelinkflags.is_empty());
    assert!(info.sharedlinkflags.is_empty());
}

#[test]
fn test_cook_macos_frameworks() {
    let archive = glfw_archive();
    let recipe = recipe_for(&archive);
    let tk = TestKitchen::new(archive, RecordingGenerator::default());

    let info = tk
        .kitchen
        .cook_profile(&recipe, &Profile::for_os(OperatingSystem::Macos), &tk.output_dir())
        .unwrap()
        .package_info;

    assert_eq!(info.libs, ["glfw3"]);
    for flags in [&info.exelinkflags, &info.sharedlinkflags] {
        assert_eq!(flags.len(), 1);
        for framework in ["OpenGL", "Cocoa", "IOKit", "CoreVideo"] {
            assert!(flags[0].contains(&format!("-framework {}", framework)));
        }
    }
}

#[test]
fn test_cook_windows_has_no_fpic() {
    let archive = glfw_archive();
    let recipe = recipe_for(&archive);
    let tk = TestKitchen::new(archive, RecordingGenerator::default());

    let variant = tk
        .kitchen
        .configure(&recipe, &Profile::for_os(OperatingSystem::Windows), &[], &[])
        .unwrap();
    assert!(!variant.options.contains("fPIC"));

    let result = tk.kitchen.cook(&recipe, &variant, &tk.output_dir()).unwrap();
    let plan = tk.generator.last_plan().unwrap();
    assert!(!plan.definitions.contains_key("CMAKE_POSITION_INDEPENDENT_CODE"));
    assert_eq!(result.package_info.libs, ["glfw3"]);
    assert!(result.package_info.exelinkflags.is_empty());
}

#[test]
fn test_checksum_mismatch_aborts_before_build() {
    let archive = glfw_archive();
    let mut recipe = recipe_for(&archive);
    recipe.source.checksum = format!("sha256:{}", "0".repeat(64));
    let tk = TestKitchen::new(archive, RecordingGenerator::default());

    let err = tk
        .kitchen
        .cook_profile(&recipe, &Profile::for_os(OperatingSystem::Linux), &tk.output_dir())
        .unwrap_err();

    assert!(matches!(err, Error::ChecksumMismatch { .. }));
    assert!(tk.generator.steps().is_empty());
    assert!(!tk.work_dir().join("glfw-3.3.2_build").exists());
    assert!(!tk.work_dir().join("glfw-3.3.2_sources").exists());

    // Nothing half-downloaded is left in the cache
    let cached: Vec<_> = fs::read_dir(tk.root.path().join("cache")).unwrap().collect();
    assert!(cached.is_empty());

    // No package directory was created
    let output = tk.output_dir();
    assert!(!output.exists() || fs::read_dir(&output).unwrap().next().is_none());
}

#[test]
fn test_checksum_mismatch_keeps_previous_package() {
    let archive = glfw_archive();
    let good = recipe_for(&archive);
    let tk = TestKitchen::new(archive, RecordingGenerator::default());
    let profile = Profile::for_os(OperatingSystem::Linux);

    let first = tk.kitchen.cook_profile(&good, &profile, &tk.output_dir()).unwrap();

    let mut bad = good.clone();
    bad.source.checksum = format!("sha256:{}", "f".repeat(64));
    let err = tk.kitchen.cook_profile(&bad, &profile, &tk.output_dir()).unwrap_err();
    assert!(matches!(err, Error::ChecksumMismatch { .. }));

    assert!(first.package_dir.join("lib/libglfw3.a").is_file());
    assert!(first.package_dir.join("LICENSE.md").is_file());
    assert!(first.package_dir.join("package_info.json").is_file());
    assert_eq!(tk.generator.steps().len(), 3);
}

#[test]
fn test_output_inside_work_dir_keeps_file_contents() {
    let archive = glfw_archive();
    let recipe = recipe_for(&archive);
    let tk = TestKitchen::new(archive, RecordingGenerator::default());
    let profile = Profile::for_os(OperatingSystem::Windows);

    // Same directory for sources, build tree and package, as with
    // `--work-dir . --output .`
    for _ in 0..2 {
        let result = tk.kitchen.cook_profile(&recipe, &profile, &tk.work_dir()).unwrap();
        assert_eq!(fs::read(result.package_dir.join("bin/glfw.pdb")).unwrap(), b"pdb");
        assert_eq!(
            fs::read_to_string(result.package_dir.join("LICENSE.md")).unwrap(),
            "Copyright (c) 2002-2006 Marcus Geelnard\n"
        );
    }
}

#[test]
fn test_recipe_export_wins_over_upstream_copy() {
    let archive = glfw_archive();
    let checksum = glfw_recipe::hash::hash_bytes(glfw_recipe::HashAlgorithm::Sha256, &archive)
        .to_prefixed_string();
    let tk = TestKitchen::new(archive, RecordingGenerator::default());

    let recipe_dir = tk.root.path().join("recipe");
    fs::create_dir_all(&recipe_dir).unwrap();
    let content = GLFW_RECIPE.replace(
        "sha256:98768e12e615fbe9f3386f5bbfeb91b5a3b45a8c4c77159cef06b1f6ff749537",
        &checksum,
    );
    fs::write(recipe_dir.join("glfw.toml"), content).unwrap();
    fs::write(recipe_dir.join("LICENSE.md"), "zlib license shipped with the recipe\n").unwrap();

    let recipe = parse_recipe_file(&recipe_dir.join("glfw.toml")).unwrap();
    assert_eq!(recipe.export_root.as_deref(), Some(recipe_dir.as_path()));

    let result = tk
        .kitchen
        .cook_profile(&recipe, &Profile::for_os(OperatingSystem::Linux), &tk.output_dir())
        .unwrap();
    assert_eq!(
        fs::read_to_string(result.package_dir.join("LICENSE.md")).unwrap(),
        "zlib license shipped with the recipe\n"
    );
}

#[test]
fn test_cook_twice_is_idempotent() {
    let archive = glfw_archive();
    let recipe = recipe_for(&archive);
    let tk = TestKitchen::new(archive, RecordingGenerator::default());
    let profile = Profile::for_os(OperatingSystem::Linux);

    let first = tk.kitchen.cook_profile(&recipe, &profile, &tk.output_dir()).unwrap();
    let second = tk.kitchen.cook_profile(&recipe, &profile, &tk.output_dir()).unwrap();

    assert_eq!(first.package_info, second.package_info);
    assert_eq!(first.package_dir, second.package_dir);
    assert_eq!(first.packaged_files, second.packaged_files);
    // The second run is served from the source cache
    assert_eq!(tk.fetcher.calls(), 1);
}

#[test]
fn test_build_failure_propagates() {
    let archive = glfw_archive();
    let recipe = recipe_for(&archive);
    let tk = TestKitchen::new(archive, RecordingGenerator::failing_on(BuildStep::Build));

    let err = tk
        .kitchen
        .cook_profile(&recipe, &Profile::for_os(OperatingSystem::Linux), &tk.output_dir())
        .unwrap_err();

    match err {
        Error::BuildError { phase, .. } => assert_eq!(phase, "build"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(tk.generator.steps(), vec![BuildStep::Configure, BuildStep::Build]);
}

#[test]
fn test_missing_pdb_is_silent() {
    struct NoPdb(RecordingGenerator);

    impl BuildGenerator for NoPdb {
        fn name(&self) -> &str {
            "no-pdb"
        }

        fn run(&self, step: BuildStep, plan: &BuildPlan) -> glfw_recipe::Result<StepOutput> {
            let output = self.0.run(step, plan)?;
            if step == BuildStep::Build {
                fs::remove_file(plan.build_dir.join("src/Release/glfw.pdb"))?;
            }
            Ok(output)
        }
    }

    let archive = glfw_archive();
    let recipe = recipe_for(&archive);
    let root = tempfile::tempdir().unwrap();
    let config = glfw_recipe::KitchenConfig {
        source_cache: root.path().join("cache"),
        show_progress: false,
        ..Default::default()
    };
    let kitchen = glfw_recipe::Kitchen::with_tools(
        config,
        std::sync::Arc::new(common::FixtureFetcher::new(archive)),
        std::sync::Arc::new(NoPdb(RecordingGenerator::default())),
    );

    let result = kitchen
        .cook_profile(&recipe, &Profile::for_os(OperatingSystem::Windows), &root.path().join("out"))
        .unwrap();
    assert!(!result.package_dir.join("bin").exists());
    assert!(result.package_dir.join("LICENSE.md").is_file());
}

#[test]
fn test_cook_writes_requested_generators() {
    let archive = glfw_archive();
    let recipe = recipe_for(&archive);
    let mut tk = TestKitchen::new(archive, RecordingGenerator::default());
    let mut config = tk.kitchen.config().clone();
    config.generators = vec![InfoGenerator::Json, InfoGenerator::Cmake, InfoGenerator::Cargo];
    tk.kitchen = glfw_recipe::Kitchen::with_tools(config, tk.fetcher.clone(), tk.generator.clone());

    let result = tk
        .kitchen
        .cook_profile(&recipe, &Profile::for_os(OperatingSystem::Linux), &tk.output_dir())
        .unwrap();

    assert_eq!(result.generated.len(), 3);
    let cmake = fs::read_to_string(result.package_dir.join("buildinfo.cmake")).unwrap();
    assert!(cmake.contains("GLFW_LIBS"));
    let cargo = fs::read_to_string(result.package_dir.join("cargo_link.txt")).unwrap();
    assert!(cargo.contains("cargo:rustc-link-lib=static=glfw3"));
    assert!(cargo.contains("cargo:rustc-link-lib=X11"));

    let json = fs::read_to_string(result.package_dir.join("package_info.json")).unwrap();
    let parsed: glfw_recipe::PackageInfo = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, result.package_info);
}
