//! Command handlers: each returns the process exit code on success

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::{Description, RenderSettings, TreeDisplay};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{
    is_legal, CodedEntry, ContentTree, DocumentType, InsertionContext, Position, RelationshipType,
    TreeFlavor, TreeKind, ValueType,
};
use crate::exitcode;

pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see --help".to_string(),
        ));
    };
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(exitcode::OK);
    }

    let settings = Settings::load(cli.config.as_deref())?;
    debug!(?settings, "effective settings");
    match command {
        Commands::Show { file, fragment } => cmd_show(&settings, file, *fragment),
        Commands::Find {
            file,
            code,
            scheme,
            fragment,
        } => cmd_find(&settings, file, code, scheme, *fragment),
        Commands::Check {
            relationship,
            value_type,
            parent,
            fragment,
            document_type,
        } => {
            let constraints = if *fragment {
                *document_type
            } else {
                Some(document_type.unwrap_or(settings.document_type))
            };
            cmd_check(*relationship, *value_type, *parent, *fragment, constraints)
        }
        Commands::Config { command } => cmd_config(&settings, command),
        Commands::Completion { .. } => Ok(exitcode::OK),
    }
}

#[instrument(skip(settings))]
fn cmd_show(settings: &Settings, file: &Path, fragment: bool) -> CliResult<i32> {
    let description = Description::load(file)?;
    let title = file.display().to_string();
    let outline = if fragment {
        description
            .build_fragment()?
            .to_outline(&title, &settings.render)
    } else {
        description
            .build_document(settings.document_type)?
            .to_outline(&title, &settings.render)
    };
    output::info(&outline);
    Ok(exitcode::OK)
}

#[instrument(skip(settings))]
fn cmd_find(
    settings: &Settings,
    file: &Path,
    code: &str,
    scheme: &str,
    fragment: bool,
) -> CliResult<i32> {
    let description = Description::load(file)?;
    let concept = CodedEntry::new(code, scheme, "");
    let found = if fragment {
        report_matches(&mut description.build_fragment()?, &concept, &settings.render)
    } else {
        report_matches(
            &mut description.build_document(settings.document_type)?,
            &concept,
            &settings.render,
        )
    };
    if found == 0 {
        output::failure(&format!("no node named ({code},{scheme})"));
    }
    Ok(exitcode::OK)
}

/// Walks all matches with repeated forward searches, returns their number.
fn report_matches<F: TreeFlavor>(
    tree: &mut ContentTree<F>,
    concept: &CodedEntry,
    render: &RenderSettings,
) -> usize {
    let mut found = 0;
    let mut next = tree.goto_named_node_from_root(concept);
    while next.is_some() {
        found += 1;
        if let (Some(position), Some(node)) = (tree.position(), tree.current_node()) {
            output::detail(&format!(
                "{:<10} {}",
                position,
                crate::application::render::label(node, render)
            ));
        }
        next = tree.goto_named_node(concept);
    }
    found
}

#[instrument]
fn cmd_check(
    relationship: RelationshipType,
    value_type: ValueType,
    parent: Option<ValueType>,
    fragment: bool,
    constraints: Option<DocumentType>,
) -> CliResult<i32> {
    let context = InsertionContext {
        kind: if fragment {
            TreeKind::Fragment
        } else {
            TreeKind::Document
        },
        position: parent.map_or(Position::Root, Position::Child),
        constraints,
    };
    let message = check_message(relationship, value_type, parent, constraints);
    if is_legal(relationship, value_type, &context) {
        output::success(&message);
        Ok(exitcode::OK)
    } else {
        output::failure(&message);
        Ok(exitcode::REJECTED)
    }
}

fn check_message(
    relationship: RelationshipType,
    value_type: ValueType,
    parent: Option<ValueType>,
    constraints: Option<DocumentType>,
) -> String {
    let below = parent.map_or_else(|| "as first node".to_string(), |p| format!("below {p}"));
    let rules = constraints.map_or_else(|| "unconstrained".to_string(), |t| t.to_string());
    format!("{relationship} {value_type} {below} ({rules})")
}

fn cmd_config(settings: &Settings, command: &ConfigCommands) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => {
            output::header("Effective settings");
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => {
                let state = if path.exists() { "exists" } else { "not found" };
                output::detail(&format!("global: {} ({state})", path.display()));
            }
            None => output::detail(&"global: no config directory available"),
        },
    }
    Ok(exitcode::OK)
}
