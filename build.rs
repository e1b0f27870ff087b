// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: dataset id
fn dataset_id_arg() -> Arg {
    Arg::new("dataset_id").required(true).help("Dataset id")
}

/// Common argument: archive output path
fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .required(true)
        .help("Output file")
}

fn build_cli() -> Command {
    Command::new("fmhub")
        .version(env!("CARGO_PKG_VERSION"))
        .author("fmhub Contributors")
        .about("Feature-model dataset hub: UVL ingestion, archival sync and export")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .default_value("/etc/fmhub/fmhub.toml")
                .help("Path to the configuration file"),
        )
        .subcommand(Command::new("init").about("Initialize the database and storage directories"))
        .subcommand(
            Command::new("stage")
                .about("Stage a UVL file for a user's next dataset")
                .arg(Arg::new("user").required(true).help("Owning user id"))
                .arg(Arg::new("file").required(true).help("Path to the .uvl file")),
        )
        .subcommand(
            Command::new("ingest")
                .about("Create a dataset from staged files")
                .arg(Arg::new("request").required(true).help("Path to the ingestion request"))
                .arg(
                    Arg::new("user_profile")
                        .short('u')
                        .long("user-profile")
                        .required(true)
                        .help("Path to the uploading user's profile (TOML)"),
                )
                .arg(
                    Arg::new("no_sync")
                        .long("no-sync")
                        .action(ArgAction::SetTrue)
                        .help("Skip synchronization with the archival service"),
                ),
        )
        .subcommand(
            Command::new("sync")
                .about("Publish a dataset to the archival service")
                .arg(dataset_id_arg()),
        )
        .subcommand(
            Command::new("export")
                .about("Export one dataset as a ZIP archive")
                .arg(dataset_id_arg())
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .help("Add converted copies of every UVL file: json, xml, yaml"),
                )
                .arg(output_arg())
                .arg(Arg::new("user").long("user").help("Downloading user id"))
                .arg(Arg::new("token").long("token").help("Download cookie")),
        )
        .subcommand(
            Command::new("export-all")
                .about("Export every synchronized dataset with DIMACS, Glencoe and SPLOT copies")
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("List datasets")
                .arg(Arg::new("user").short('u').long("user").help("Only datasets of this user")),
        )
        .subcommand(
            Command::new("show")
                .about("Show a dataset and record a view")
                .arg(dataset_id_arg())
                .arg(Arg::new("user").long("user").help("Viewing user id"))
                .arg(Arg::new("token").long("token").help("View cookie")),
        )
        .subcommand(
            Command::new("resolve")
                .about("Find the dataset behind a DOI, following redirects")
                .arg(Arg::new("doi").required(true)),
        )
        .subcommand(
            Command::new("rate")
                .about("Rate a dataset from 1 to 5")
                .arg(dataset_id_arg())
                .arg(Arg::new("user_id").required(true))
                .arg(Arg::new("value").required(true)),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a dataset, its files and its metadata")
                .arg(dataset_id_arg()),
        )
        .subcommand(
            Command::new("redirect")
                .about("DOI redirect management")
                .subcommand(Command::new("list").about("List all DOI redirects"))
                .subcommand(
                    Command::new("add")
                        .about("Map a retired DOI to its replacement")
                        .arg(Arg::new("old_doi").required(true))
                        .arg(Arg::new("new_doi").required(true)),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(Arg::new("shell").required(true)),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
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

    let man_path = man_dir.join("fmhub.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
