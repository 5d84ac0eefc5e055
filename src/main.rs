use clap::{Arg, Command};
use std::path::PathBuf;

use horizons::config::HorizonsConfig;
use horizons::core::document::DocumentOverrides;
use horizons::core::horizon::HorizonKind;
use horizons::sync::store::FsStore;
use horizons::sync::{EditReport, Workspace};

fn cli() -> Command {
    let path = || Arg::new("path").required(true).help("Workspace-relative document path");
    Command::new("horizons")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plain-markdown GTD horizon documents with reciprocal references")
        .subcommand_required(true)
        .arg(
            Arg::new("workspace")
                .long("workspace")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Workspace root (overrides the config file)"),
        )
        .subcommand(
            Command::new("show")
                .about("Print the structured record of a document as JSON")
                .arg(path()),
        )
        .subcommand(
            Command::new("normalize")
                .about("Rewrite a document in canonical form")
                .arg(path()),
        )
        .subcommand(
            Command::new("create")
                .about("Create a new document from the canonical skeleton")
                .arg(Arg::new("kind").required(true).help("project, area, goal, vision, purpose or habit"))
                .arg(Arg::new("name").required(true).help("Document name")),
        )
        .subcommand(
            Command::new("link")
                .about("Reference target from source, updating both documents")
                .arg(Arg::new("source").required(true))
                .arg(Arg::new("target").required(true)),
        )
        .subcommand(
            Command::new("unlink")
                .about("Remove a reference on both sides")
                .arg(Arg::new("source").required(true))
                .arg(Arg::new("target").required(true)),
        )
        .subcommand(
            Command::new("forget")
                .about("Prune a deleted document from every document that references it")
                .arg(path()),
        )
        .subcommand(
            Command::new("history")
                .about("Print a habit's history entries as JSON")
                .arg(path()),
        )
}

fn print_report(report: &EditReport) {
    if report.changed {
        println!("Saved {}", report.path);
    } else {
        println!("{} unchanged", report.path);
    }
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    if !horizons::init_journal_logging("horizons") {
        eprintln!("journal unavailable; logging disabled");
    }
    let mut config = HorizonsConfig::load();
    horizons::set_debug_logging(config.debug_logging);

    if let Some(root) = matches.get_one::<PathBuf>("workspace") {
        config.workspace_root = root.clone();
    }
    config.ensure_layout()?;
    let workspace = Workspace::new(FsStore::new(&config.workspace_root));

    let arg = |args: &clap::ArgMatches, name: &str| -> String {
        args.get_one::<String>(name).cloned().unwrap_or_default()
    };

    match matches.subcommand() {
        Some(("show", args)) => {
            let doc = workspace.load(&arg(args, "path")).await?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Some(("normalize", args)) => {
            let report = workspace
                .apply_edit(&arg(args, "path"), &DocumentOverrides::default())
                .await?;
            print_report(&report);
        }
        Some(("create", args)) => {
            let kind_name = arg(args, "kind");
            let kind = HorizonKind::from_name(&kind_name)
                .ok_or_else(|| format!("unknown horizon kind: {}", kind_name))?;
            let path = workspace.create(kind, &arg(args, "name")).await?;
            println!("Created {}", path);
        }
        Some(("link", args)) => {
            let report = workspace.link(&arg(args, "source"), &arg(args, "target")).await?;
            print_report(&report);
        }
        Some(("unlink", args)) => {
            let report = workspace.unlink(&arg(args, "source"), &arg(args, "target")).await?;
            print_report(&report);
        }
        Some(("forget", args)) => {
            let report = workspace.references().forget(&arg(args, "path")).await?;
            for path in &report.pruned {
                println!("Pruned {}", path);
            }
            for warning in &report.warnings {
                eprintln!("warning: {}", warning);
            }
        }
        Some(("history", args)) => {
            let doc = workspace.load(&arg(args, "path")).await?;
            let rows: Vec<serde_json::Value> = doc
                .history_entries()
                .into_iter()
                .map(|entry| {
                    serde_json::json!({
                        "status_class": entry.status_class(),
                        "action_class": entry.action_class(),
                        "entry": entry,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn workspace_flag_is_global() {
        let matches = cli()
            .try_get_matches_from(["horizons", "show", "goals/Run.md", "--workspace", "/tmp/ws"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("workspace"),
            Some(&PathBuf::from("/tmp/ws"))
        );
    }
}
