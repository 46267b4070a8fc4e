//! Bindery CLI - inspect and edit models with selectors

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use bindery::error::{BinderyError, FixSuggestion};
use bindery::{Binder, Config, Value};

#[derive(Parser)]
#[command(name = "bindery")]
#[command(about = "Bindery - resolve and assign selectors against JSON/YAML models")]
#[command(version)]
struct Cli {
    /// YAML config file (selector delimiter, coercion)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value a selector resolves to (null on miss)
    Resolve {
        /// Model file (.json, .yaml or .yml)
        file: PathBuf,

        /// Selector, e.g. a.b.1
        selector: String,
    },

    /// Assign a value and print the resulting model
    Assign {
        /// Model file (.json, .yaml or .yml)
        file: PathBuf,

        /// Selector, e.g. a.b.1
        selector: String,

        /// JSON value (plain text is taken as a string)
        value: String,

        /// Write the model back to FILE as JSON
        #[arg(short, long)]
        write: bool,
    },

    /// Print a selector's segments, model part and index
    Segments {
        /// Selector, e.g. a.b.1
        selector: String,
    },
}

fn main() {
    // Diagnostics go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_binder(cli.config.as_deref()).and_then(|binder| match cli.command {
        Commands::Resolve { file, selector } => resolve(&binder, &file, &selector),
        Commands::Assign {
            file,
            selector,
            value,
            write,
        } => assign(&binder, &file, &selector, &value, write),
        Commands::Segments { selector } => {
            segments(&binder, &selector);
            Ok(())
        }
    });

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load_binder(path: Option<&Path>) -> Result<Binder, BinderyError> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    Binder::with_config(config)
}

fn load_model(file: &Path) -> Result<Value, BinderyError> {
    let text = fs::read_to_string(file)?;
    match file.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => Value::from_yaml_str(&text),
        _ => Value::from_json_str(&text),
    }
}

fn resolve(binder: &Binder, file: &Path, selector: &str) -> Result<(), BinderyError> {
    let model = load_model(file)?;
    let value = binder.resolve(&model, selector);
    println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    Ok(())
}

fn assign(
    binder: &Binder,
    file: &Path,
    selector: &str,
    value: &str,
    write: bool,
) -> Result<(), BinderyError> {
    let mut model = load_model(file)?;
    let value = Value::from_json_str(value).unwrap_or_else(|_| Value::from(value));

    if !binder.assign(&mut model, selector, value) {
        return Err(BinderyError::AssignmentMiss {
            selector: selector.to_string(),
        });
    }

    let json = serde_json::to_string_pretty(&model.to_json())?;
    if write {
        fs::write(file, format!("{json}\n"))?;
        eprintln!("{} Wrote {}", "✓".green(), file.display());
    }
    println!("{json}");
    Ok(())
}

fn segments(binder: &Binder, text: &str) {
    let selector = binder.selector(text);
    let delimiter = binder.config().selector.delimiter;
    for segment in selector.segments() {
        println!("{segment}");
    }
    println!(
        "{} {}",
        "model:".cyan(),
        selector.model().to_string_with(delimiter)
    );
    println!("{} {}", "index:".cyan(), selector.index());
}
