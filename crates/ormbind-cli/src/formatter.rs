//! Output formatters for compiled models.

use clap::ValueEnum;
use comfy_table::Table;
use ormbind_core::{ResolvedModel, Table as ModelTable};

/// Output format for a compiled model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One-line counts followed by warnings
    Summary,
    /// One table per entity and per table
    Table,
    /// The full model as JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Summary => write!(f, "summary"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Formatter trait for different output formats.
pub trait Formatter: Send + Sync {
    /// Format a compiled model.
    fn format_model(&self, model: &ResolvedModel) -> Result<String, serde_json::Error>;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Summary => Box::new(SummaryFormatter),
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Counts and warnings only.
pub struct SummaryFormatter;

impl Formatter for SummaryFormatter {
    fn format_model(&self, model: &ResolvedModel) -> Result<String, serde_json::Error> {
        let stats = model.stats();
        let mut output = format!(
            "{} entities ({} roots), {} tables, {} columns, {} foreign keys",
            stats.entities, stats.roots, stats.tables, stats.columns, stats.foreign_keys
        );
        for warning in &model.warnings {
            output.push_str(&format!("\nwarning: {}", warning));
        }
        Ok(output)
    }
}

/// Human-readable tables using comfy-table.
pub struct TableFormatter;

impl TableFormatter {
    fn entity_table(model: &ResolvedModel) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Entity", "Kind", "Parent", "Table", "Key"]);
        for entity in &model.entities {
            let table_name = model
                .table(entity.table)
                .map(ModelTable::qualified_name)
                .unwrap_or_default();
            table.add_row(vec![
                entity.name.clone(),
                format!("{:?}", entity.kind),
                entity.super_entity.clone().unwrap_or_default(),
                table_name,
                entity.key_columns.join(", "),
            ]);
        }
        table
    }

    fn column_table(model: &ResolvedModel, source: &ModelTable) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Column", "Type", "Nullable", "Key", "References"]);
        for column in &source.columns {
            let key = if source.primary_key_columns().contains(&column.name) {
                "PK"
            } else if column.unique {
                "UNIQUE"
            } else {
                ""
            };
            let references = source
                .foreign_keys
                .iter()
                .find(|fk| fk.columns.contains(&column.name))
                .map(|fk| {
                    let target = fk
                        .referenced_table
                        .and_then(|id| model.table(id))
                        .map(ModelTable::qualified_name)
                        .unwrap_or_else(|| fk.referenced_entity.clone());
                    format!("{} ({})", target, fk.name)
                })
                .unwrap_or_default();
            table.add_row(vec![
                column.name.clone(),
                column.sql_type.clone().unwrap_or_default(),
                if column.nullable { "yes" } else { "no" }.to_string(),
                key.to_string(),
                references,
            ]);
        }
        table
    }
}

impl Formatter for TableFormatter {
    fn format_model(&self, model: &ResolvedModel) -> Result<String, serde_json::Error> {
        let mut sections = vec![Self::entity_table(model).to_string()];
        for source in &model.tables {
            let mut title = source.qualified_name();
            if source.is_abstract {
                title.push_str(" (abstract)");
            }
            sections.push(format!("{}\n{}", title, Self::column_table(model, source)));
        }
        if !model.warnings.is_empty() {
            let mut warnings = Table::new();
            warnings.set_header(vec!["Subject", "Warning"]);
            for warning in &model.warnings {
                warnings.add_row(vec![warning.subject().to_string(), warning.to_string()]);
            }
            sections.push(warnings.to_string());
        }
        Ok(sections.join("\n\n"))
    }
}

/// JSON output.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_model(&self, model: &ResolvedModel) -> Result<String, serde_json::Error> {
        model.to_json_pretty()
    }
}
