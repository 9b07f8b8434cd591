//! ormbind Command-Line Compiler
//!
//! Compiles a JSON mapping document into a resolved table model and prints it.

mod error;
mod formatter;

use clap::{Parser, ValueEnum};
use formatter::OutputFormat;
use ormbind_core::{CompileConfig, MappingSource, MetadataCompiler, NamingStrategy};
use std::path::PathBuf;

use crate::error::CliError;

/// Naming strategy for implicit tables and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Naming {
    /// Use entity and property names as they are
    Verbatim,
    /// Convert names to snake_case
    SnakeCase,
}

impl From<Naming> for NamingStrategy {
    fn from(naming: Naming) -> Self {
        match naming {
            Naming::Verbatim => NamingStrategy::Verbatim,
            Naming::SnakeCase => NamingStrategy::SnakeCase,
        }
    }
}

/// ormbind Command-Line Compiler
#[derive(Parser, Debug)]
#[command(name = "ormbind")]
#[command(version, about = "Compile mapping descriptors into a resolved table model")]
pub struct Args {
    /// Mapping document (JSON)
    pub file: PathBuf,

    /// Naming strategy for implicit names
    #[arg(long, default_value = "verbatim", value_enum)]
    pub naming: Naming,

    /// Schema for tables that declare none
    #[arg(long)]
    pub default_schema: Option<String>,

    /// Catalog for tables that declare none
    #[arg(long)]
    pub default_catalog: Option<String>,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,

    /// Output format
    #[arg(long, default_value = "summary", value_enum)]
    pub format: OutputFormat,
}

impl Args {
    /// Build the compiler configuration from the flags.
    fn config(&self) -> CompileConfig {
        let mut config = CompileConfig::new().with_naming(self.naming.into());
        if let Some(schema) = &self.default_schema {
            config = config.with_default_schema(schema);
        }
        if let Some(catalog) = &self.default_catalog {
            config = config.with_default_catalog(catalog);
        }
        if self.strict {
            config = config.strict();
        }
        config
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ormbind=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let source = MappingSource::from_path(&args.file)?;
    tracing::debug!(
        file = %args.file.display(),
        classes = source.classes.len(),
        "loaded mapping document"
    );

    let compiler = MetadataCompiler::new(args.config());
    let model = compiler.compile(&source)?;

    let formatter = formatter::create_formatter(args.format);
    println!("{}", formatter.format_model(&model)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_map_to_config() {
        let args = Args::parse_from([
            "ormbind",
            "mapping.json",
            "--naming",
            "snake-case",
            "--default-schema",
            "app",
            "--strict",
        ]);
        let config = args.config();
        assert_eq!(config.naming, NamingStrategy::SnakeCase);
        assert_eq!(config.default_schema.as_deref(), Some("app"));
        assert!(config.strict_warnings);
        assert_eq!(args.format, OutputFormat::Summary);
    }
}
