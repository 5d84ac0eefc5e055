use clap::{Arg, Command};
use std::path::PathBuf;

use horizons::config::HorizonsConfig;
use horizons::sync::store::FsStore;
use horizons::sync::{DriftKind, ReferenceSync};

#[tokio::main]
async fn main() {
    let matches = Command::new("ref_check")
        .about("Report references whose reverse side is missing")
        .arg(
            Arg::new("workspace")
                .long("workspace")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Workspace root (overrides the config file)"),
        )
        .get_matches();

    horizons::init_journal_logging("horizons-ref-check");
    let config = HorizonsConfig::load();
    horizons::set_debug_logging(config.debug_logging);

    let root = matches
        .get_one::<PathBuf>("workspace")
        .cloned()
        .unwrap_or(config.workspace_root);

    println!("=== Reference check: {} ===\n", root.display());

    let store = FsStore::new(&root);
    let drift = match ReferenceSync::new(&store).drift().await {
        Ok(drift) => drift,
        Err(e) => {
            println!("  Failed to scan workspace: {}", e);
            std::process::exit(2);
        }
    };

    let count = |kind: DriftKind| drift.iter().filter(|d| d.kind == kind).count();

    for entry in &drift {
        println!("  {}", entry);
    }

    println!("\n=== Summary ===");
    println!("  Missing backlinks: {}", count(DriftKind::MissingBacklink));
    println!("  Missing targets:   {}", count(DriftKind::MissingTarget));
    println!("  Misfiled targets:  {}", count(DriftKind::MisfiledTarget));

    if !drift.is_empty() {
        std::process::exit(1);
    }
}
