//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, Document, IoResultExt};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::xml;
use crate::infrastructure::InfraError;
use crate::tree_traits::{TocOutline, TreeNodeConvert};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".to_string()));
    };

    match command {
        Commands::Merge { src, out } => cmd_merge(&container(cli)?, src, out),
        Commands::Split { src, out } => cmd_split(&container(cli)?, src, out),
        Commands::Clean { src, out } => cmd_clean(&container(cli)?, src, out.as_deref()),
        Commands::Outline { src } => cmd_outline(&container(cli)?, src),
        Commands::Config { command } => cmd_config(cli.config.as_deref(), command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(cli.config.as_deref())?;
    Ok(ServiceContainer::new(settings))
}

#[instrument(skip(container))]
fn cmd_merge(container: &ServiceContainer, src: &Path, out: &Path) -> CliResult<()> {
    let tree = container.resolver().open_and_replace(src)?;
    Document::new(out, tree).save(container.fs.as_ref())?;
    output::action("Merged", &out.display());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_split(container: &ServiceContainer, src: &Path, out: &Path) -> CliResult<()> {
    let resolver = container.normalizing_resolver()?;
    let report = container.splitter().resolve_and_split(&resolver, src, out)?;
    output::action(
        "Split",
        &format!(
            "{} chapters, {} index files in {}",
            report.chapters.len(),
            report.indexes.len(),
            out.display()
        ),
    );
    Ok(())
}

#[instrument(skip(container))]
fn cmd_clean(container: &ServiceContainer, src: &Path, out: Option<&Path>) -> CliResult<()> {
    let tree = container.book_service().clean(src)?;
    match out {
        Some(out) => {
            Document::new(out, tree).save(container.fs.as_ref())?;
            output::action("Cleaned", &out.display());
        }
        None => {
            let text = xml::to_string(&tree).map_err(|e| ApplicationError::OperationFailed {
                context: format!("serialize {}", src.display()),
                source: Box::new(e),
            })?;
            output::info(text.trim_end());
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_outline(container: &ServiceContainer, src: &Path) -> CliResult<()> {
    let tree = container.resolver().open_and_replace(src)?;
    let outline = TocOutline::new(&tree, &container.settings.split);
    output::info(&outline.to_tree_string());
    Ok(())
}

fn cmd_config(config_file: Option<&Path>, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(config_file)?;
            output::info(settings.to_toml()?.trim_end());
            Ok(())
        }
        ConfigCommands::Init { path, force } => {
            let target = match path {
                Some(path) => path.clone(),
                None => global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?,
            };
            if target.exists() && !force {
                return Err(CliError::InvalidArgs(format!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                )));
            }
            debug!("writing config template to {}", target.display());
            if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&target, Settings::template()).or_write_failure(&target)?;
            output::success(&format!("Created {}", target.display()));
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let marker = if path.exists() { "" } else { " (not found)" };
                    output::action("global", &format!("{}{}", path.display(), marker));
                }
                None => output::warning("cannot determine global config directory"),
            }
            if let Some(path) = config_file {
                let marker = if path.exists() { "" } else { " (not found)" };
                output::action("file", &format!("{}{}", path.display(), marker));
            }
            Ok(())
        }
    }
}
