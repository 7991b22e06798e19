//! `votelist init` command - Initialize a new votelist project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::helpers::print_success;
use crate::core::project::{Project, ProjectError};
use crate::core::store::Store;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Force initialization even if .votelist/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        print_success(&format!("Created directory {}", style(path.display()).cyan()));
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            // Creates the schema and seeds report types
            Store::open(&project)?;

            print_success(&format!(
                "Initialized votelist project at {}",
                style(project.root().display()).cyan()
            ));
            println!();
            println!("Created project structure:");
            print_structure(project.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Load voters from a CSV export",
                style("votelist import voters voters.csv").yellow()
            );
            println!(
                "  {} Browse the first page",
                style("votelist voters list --user 1").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} votelist project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("votelist init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn print_structure(root: &Path) {
    let entries = [
        ".votelist/",
        ".votelist/config.yaml",
        ".votelist/votelist.db",
        ".votelist/reports/",
    ];

    for entry in entries {
        if root.join(entry).exists() {
            println!("  {}", style(entry).dim());
        }
    }
}
