use crate::app::{App, LogEventBus};
use crate::error::{AppError, AppResult};
use clap::{Args, Parser, Subcommand};
use engine::restore_points::{RestorePointEntry, RestorePointTreeNode, TreeNodeType};
use engine::theme::{ListOptions, ListProgress};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "lastlayer", version, about = "Manage desktop themes and restore points")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect and manage installed themes
    #[command(subcommand)]
    Themes(ThemeCommand),
    /// Create, browse and restore snapshots of the default theme
    #[command(subcommand)]
    Points(PointCommand),
    /// Status bar bookkeeping for the default theme
    #[command(subcommand)]
    Bar(BarCommand),
}

#[derive(Subcommand, Debug)]
pub enum ThemeCommand {
    /// List installed themes
    List {
        /// Show progress while reading theme metadata
        #[arg(long)]
        progress: bool,
    },
    /// Show one theme
    Show { name: String },
    /// Delete a theme directory
    Delete { name: String },
    /// Print or update a theme's parameter overrides
    Overrides {
        name: String,
        /// key=value pairs to merge into the stored overrides
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Watch the themes directory and log changes
    Watch {
        /// Stop after this many seconds
        #[arg(long, default_value_t = 60)]
        seconds: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum PointCommand {
    /// List restore points, newest first
    List,
    /// Show the active restore point
    Active,
    /// Refresh the default theme from config folders and snapshot it
    Create(CreateArgs),
    /// Snapshot the default theme as is
    Auto {
        #[arg(long)]
        theme: Option<String>,
    },
    /// Replace the default theme with a restore point
    Restore { id: String },
    /// Delete a restore point
    Delete { id: String },
    /// Print the file tree of a restore point
    Tree {
        id: String,
        #[arg(long)]
        max_nodes: Option<usize>,
    },
    /// Print a text file from a restore point
    Cat { id: String, path: String },
    /// Replace a text file inside a restore point with a local file's text
    Write {
        id: String,
        path: String,
        #[arg(long)]
        from: PathBuf,
    },
    /// Create a folder inside a restore point
    Mkdir { id: String, path: String },
    /// Copy a local file into a restore point folder
    Import {
        id: String,
        file: PathBuf,
        #[arg(long, default_value = "")]
        into: String,
    },
    /// Copy a file out of a restore point
    Export {
        id: String,
        path: String,
        destination: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Config folder to include; repeat for several. Defaults to the saved selection
    #[arg(long = "folder")]
    pub folders: Vec<String>,
    /// Theme recorded as the source; defaults to the current theme
    #[arg(long)]
    pub theme: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum BarCommand {
    /// Detect the status bar that is currently running
    Detect,
    /// Record the default theme's status bar
    Set {
        name: String,
        /// Mark the choice as made by the user
        #[arg(long)]
        manual: bool,
    },
}

pub async fn run(app: &App, command: Command, json: bool) -> AppResult<()> {
    match command {
        Command::Themes(command) => run_theme_command(app, command, json).await,
        Command::Points(command) => run_point_command(app, command, json).await,
        Command::Bar(command) => run_bar_command(app, command).await,
    }
}

async fn run_theme_command(app: &App, command: ThemeCommand, json: bool) -> AppResult<()> {
    match command {
        ThemeCommand::List { progress } => {
            let mut options = ListOptions::default();
            if progress {
                options.progress = Some(Arc::new(|p: ListProgress| {
                    eprint!("\rReading themes {}/{}", p.completed, p.total);
                }));
            }
            let themes = app.themes.list_themes_async(options).await;
            if progress {
                eprintln!();
            }
            if json {
                return print_json(&themes);
            }
            for theme in &themes {
                match &theme.author {
                    Some(author) => println!("{:<24} {} ({author})", theme.name, theme.title),
                    None => println!("{:<24} {}", theme.name, theme.title),
                }
            }
            Ok(())
        }
        ThemeCommand::Show { name } => {
            let theme = app
                .themes
                .get_theme(&name)
                .ok_or_else(|| AppError::NotFound(format!("theme {name}")))?;
            print_json(&theme)
        }
        ThemeCommand::Delete { name } => {
            if app.themes.delete_theme(&name)? {
                println!("Deleted {name}");
                Ok(())
            } else {
                Err(AppError::NotFound(format!("theme {name}")))
            }
        }
        ThemeCommand::Overrides { name, set } => {
            let mut params = app.themes.read_overrides(&name)?;
            if !set.is_empty() {
                for pair in &set {
                    let (key, value) = parse_assignment(pair)?;
                    params.insert(key, value);
                }
                app.themes.write_overrides(&name, &params)?;
            }
            print_json(&params)
        }
        ThemeCommand::Watch { seconds } => {
            app.themes.start_monitoring(Arc::new(LogEventBus))?;
            app.themes.register_change_callback(Arc::new(|| println!("Themes changed")));
            log::info!("Watching {} for {seconds}s", app.layout.themes_root.display());
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            app.themes.stop_monitoring();
            Ok(())
        }
    }
}

async fn run_point_command(app: &App, command: PointCommand, json: bool) -> AppResult<()> {
    let points = &app.points;
    match command {
        PointCommand::List => {
            let entries = points.list_restore_points();
            if json {
                return print_json(&entries);
            }
            let active = points.store().read_restore_points_state().active_id;
            for entry in &entries {
                let marker = if active.as_deref() == Some(entry.id.as_str()) { "*" } else { " " };
                print_entry(marker, entry);
            }
            Ok(())
        }
        PointCommand::Active => match points.get_active_restore_point() {
            Some(entry) if json => print_json(&entry),
            Some(entry) => {
                print_entry("*", &entry);
                Ok(())
            }
            None => Err(AppError::NotFound("active restore point".to_string())),
        },
        PointCommand::Create(args) => {
            let theme = args.theme.unwrap_or_else(|| app.current_theme());
            let entry = points
                .create_manual_restore_point(&args.folders, &theme)
                .await
                .ok_or_else(|| AppError::Operation("creating restore point failed".to_string()))?;
            report_entry(&entry, json)
        }
        PointCommand::Auto { theme } => {
            let theme = theme.unwrap_or_else(|| app.current_theme());
            let entry = points
                .create_automatic_restore_point(&theme)
                .ok_or_else(|| AppError::Operation("creating restore point failed".to_string()))?;
            report_entry(&entry, json)
        }
        PointCommand::Restore { id } => {
            let entry = points
                .restore_restore_point(&id)
                .ok_or_else(|| AppError::NotFound(format!("restore point {id}")))?;
            println!("Restored {} (bar: {})", entry.id, entry.default_theme_bar);
            Ok(())
        }
        PointCommand::Delete { id } => {
            if points.delete_restore_point(&id) {
                println!("Deleted {id}");
                Ok(())
            } else {
                Err(AppError::NotFound(format!("restore point {id}")))
            }
        }
        PointCommand::Tree { id, max_nodes } => {
            let tree = points
                .get_restore_point_tree(&id, max_nodes)
                .ok_or_else(|| AppError::NotFound(format!("restore point {id}")))?;
            if json {
                return print_json(&tree);
            }
            print_tree(&tree, 0);
            Ok(())
        }
        PointCommand::Cat { id, path } => {
            let text = points
                .get_restore_point_file_text(&id, &path)
                .ok_or_else(|| AppError::NotFound(format!("{path} in {id}")))?;
            print!("{text}");
            Ok(())
        }
        PointCommand::Write { id, path, from } => {
            let text = std::fs::read_to_string(&from)
                .map_err(|e| AppError::Operation(format!("reading {}: {e}", from.display())))?;
            ensure(points.set_restore_point_file_text(&id, &path, &text), "writing file")
        }
        PointCommand::Mkdir { id, path } => {
            let created = points
                .create_restore_point_folder(&id, &path)
                .ok_or_else(|| AppError::Operation("creating folder failed".to_string()))?;
            println!("{}", created.display());
            Ok(())
        }
        PointCommand::Import { id, file, into } => {
            let imported = points
                .import_file_into_restore_point(&id, &file, &into)
                .ok_or_else(|| AppError::Operation("import failed".to_string()))?;
            println!("{}", imported.display());
            Ok(())
        }
        PointCommand::Export { id, path, destination } => {
            ensure(points.export_restore_point_file(&id, &path, &destination), "export")
        }
    }
}

async fn run_bar_command(app: &App, command: BarCommand) -> AppResult<()> {
    match command {
        BarCommand::Detect => {
            match app.points.detect_running_bar().await {
                Some(bar) => println!("{bar}"),
                None => println!("none"),
            }
            Ok(())
        }
        BarCommand::Set { name, manual } => {
            ensure(app.points.set_default_theme_bar(&name, manual), "setting bar")
        }
    }
}

fn ensure(succeeded: bool, operation: &str) -> AppResult<()> {
    if succeeded {
        Ok(())
    } else {
        Err(AppError::Operation(format!("{operation} failed")))
    }
}

/// Splits `key=value`; values that parse as JSON keep their type.
pub fn parse_assignment(pair: &str) -> AppResult<(String, Value)> {
    let (key, raw) = pair
        .split_once('=')
        .ok_or_else(|| AppError::Operation(format!("expected KEY=VALUE, got '{pair}'")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::Operation(format!("empty key in '{pair}'")));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Operation(format!("serializing output: {e}")))?;
    println!("{text}");
    Ok(())
}

fn report_entry(entry: &RestorePointEntry, json: bool) -> AppResult<()> {
    if json {
        return print_json(entry);
    }
    println!("Created {} from {}", entry.id, entry.source_theme);
    Ok(())
}

fn print_entry(marker: &str, entry: &RestorePointEntry) {
    println!(
        "{marker} {:<28} {:<10} {:<20} bar={}",
        entry.id,
        entry.kind.as_str(),
        entry.source_theme,
        entry.default_theme_bar
    );
}

fn print_tree(node: &RestorePointTreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node.node_type {
        TreeNodeType::Folder => println!("{indent}{}/ ({})", node.name, node.size_label),
        TreeNodeType::File => println!("{indent}{} ({})", node.name, node.size_label),
        TreeNodeType::Truncated => println!("{indent}{}", node.name),
    }
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::{assert_err, assert_ok};

    #[test]
    fn test_assignment_keeps_json_types() {
        let (key, value) = assert_ok!(parse_assignment("gap=8"));
        assert_eq!(key, "gap");
        assert_eq!(value, Value::from(8));

        let (_, value) = assert_ok!(parse_assignment("accent=#ff0000"));
        assert_eq!(value, Value::String("#ff0000".to_string()));
    }

    #[test]
    fn test_assignment_requires_key() {
        assert_err!(parse_assignment("=1"));
        assert_err!(parse_assignment("novalue"));
    }

    #[test]
    fn test_cli_parses_nested_commands() {
        let cli = Cli::parse_from([
            "lastlayer", "--json", "points", "create", "--folder", "hypr", "--folder", "waybar",
        ]);
        assert!(cli.json);
        match cli.command {
            Command::Points(PointCommand::Create(args)) => {
                assert_eq!(args.folders, vec!["hypr", "waybar"]);
                assert_eq!(args.theme, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
