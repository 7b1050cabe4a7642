// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn recipe_arg() -> Arg {
    Arg::new("recipe")
        .long("recipe")
        .value_name("PATH")
        .help("Recipe file (defaults to the built-in GLFW recipe)")
}

/// Arguments selecting a binary variant
fn variant_args() -> Vec<Arg> {
    vec![
        recipe_arg(),
        Arg::new("profile")
            .long("profile")
            .value_name("PATH")
            .help("Profile file with settings and option values"),
        Arg::new("setting")
            .short('s')
            .long("setting")
            .value_name("KEY=VALUE")
            .action(ArgAction::Append)
            .help("Setting override"),
        Arg::new("option")
            .short('o')
            .long("option")
            .value_name("NAME=VALUE")
            .action(ArgAction::Append)
            .help("Option override"),
    ]
}

fn build_cli() -> Command {
    Command::new("glfw-recipe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build GLFW from source and publish its link metadata")
        .subcommand_required(true)
        .subcommand(
            Command::new("cook")
                .about("Fetch, build and package the recipe")
                .args(variant_args())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .default_value(".")
                        .help("Directory the package directory is created in"),
                )
                .arg(Arg::new("work_dir").long("work-dir").help("Keep sources and build tree here"))
                .arg(Arg::new("source_cache").long("source-cache").help("Source archive cache"))
                .arg(Arg::new("jobs").short('j').long("jobs").help("Parallel build jobs"))
                .arg(
                    Arg::new("generator")
                        .short('g')
                        .long("generator")
                        .action(ArgAction::Append)
                        .value_parser(["json", "cmake", "cargo"])
                        .help("Metadata generator"),
                )
                .arg(
                    Arg::new("no_progress")
                        .long("no-progress")
                        .action(ArgAction::SetTrue)
                        .help("Disable download progress bars"),
                )
                .arg(
                    Arg::new("cmake")
                        .long("cmake")
                        .value_name("PATH")
                        .help("cmake executable to run"),
                )
                .arg(
                    Arg::new("cmake_generator")
                        .short('G')
                        .long("cmake-generator")
                        .value_name("NAME")
                        .help("CMake generator, e.g. Ninja"),
                ),
        )
        .subcommand(
            Command::new("source")
                .about("Fetch and extract the sources only")
                .arg(recipe_arg())
                .arg(Arg::new("dest").long("dest").default_value(".").help("Directory to extract into"))
                .arg(Arg::new("source_cache").long("source-cache").help("Source archive cache")),
        )
        .subcommand(
            Command::new("info")
                .about("Show the recipe's identity, options and link table for an OS")
                .arg(recipe_arg())
                .arg(
                    Arg::new("os")
                        .long("os")
                        .value_parser(["Windows", "Linux", "Macos", "FreeBSD"])
                        .help("Target OS (defaults to the host)"),
                ),
        )
        .subcommand(
            Command::new("package-id")
                .about("Print the package id for a profile and overrides")
                .args(variant_args()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("glfw-recipe.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
