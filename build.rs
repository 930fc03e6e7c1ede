// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn flag(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(long).action(ArgAction::SetTrue).help(help)
}

fn path_arg(id: &'static str, long: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(long).value_name(value_name).help(help)
}

fn build_cli() -> Command {
    Command::new("channel-export")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Export channel packages not available from upstream repositories or parent channels")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .arg(path_arg("directory", "dir", "DIR", "Export directory").short('d'))
        .arg(flag("force", "force", "Overwrite exported files that are already present").short('f'))
        .arg(flag("exported_only", "exported-only", "Only report exported packages"))
        .arg(flag("skip_repodata", "skip-repodata", "Do not build repository metadata for exported channels"))
        .arg(flag("no_size", "no-size", "Don't check package size").short('S'))
        .arg(flag("no_layout_check", "no-layout-check", "Don't check package paths against package attributes"))
        .arg(path_arg("database", "db", "PATH", "Path to the metadata store"))
        .arg(path_arg("mount_point", "mount-point", "PATH", "Prefix of the package store paths"))
        .arg(path_arg("config", "config", "CONFIG", "Configuration file").short('c'))
        .arg(flag("serial_index", "serial-index", "Index the repositories of a channel one at a time"))
        .arg(path_arg("log_file", "log-file", "PATH", "Also write log output to this file"))
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

    let man_path = man_dir.join("channel-export.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
