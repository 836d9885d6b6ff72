//! Infiniquery Command-Line Client
//!
//! Inspects a JSON catalog the way a caller would see it and compiles
//! logical token files into store-native queries.

mod formatter;

use clap::{Parser, Subcommand};
use formatter::{create_formatter, Formatter, OutputFormat};
use infiniquery_core::executor::{ExecutorError, QueryExecutor, Row};
use infiniquery_core::{
    CallerContext, ExecutableQuery, JsonCatalogSource, LogicalQueryItem, QueryService, Value,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Infiniquery Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "infiniquery")]
#[command(version, about = "Infiniquery Command-Line Client")]
pub struct Args {
    /// Catalog file (JSON)
    #[arg(short = 'c', long)]
    pub catalog: PathBuf,

    /// Caller roles, comma-separated
    #[arg(short = 'r', long, default_value = "")]
    pub roles: String,

    /// Caller scope attribute bound into additional entity filters (name=value)
    #[arg(short = 's', long = "scope", value_parser = parse_scope_attribute)]
    pub scope: Vec<(String, String)>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the catalog and print its find keyword
    Check,
    /// List entities visible to the caller
    Entities,
    /// List query attributes of an entity
    Attributes {
        /// Entity display name
        entity: String,
    },
    /// List operators applicable to an attribute
    Operators {
        /// Entity display name
        entity: String,
        /// Attribute display name
        attribute: String,
    },
    /// List condition separators
    Separators,
    /// Show the input control and reference values for an attribute
    Values {
        /// Entity display name
        entity: String,
        /// Attribute display name
        attribute: String,
        /// Operator display name or symbol
        operator: String,
    },
    /// Compile a logical query from a JSON token file
    Compile {
        /// File holding a token array or an executable query object
        file: PathBuf,
    },
}

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid token file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] infiniquery_core::Error),
}

/// The CLI has no data store; reference queries are rejected.
struct OfflineExecutor;

impl QueryExecutor for OfflineExecutor {
    fn execute(&self, query: &str, _params: &[Value]) -> Result<Vec<Row>, ExecutorError> {
        Err(ExecutorError::new(format!(
            "no data store configured to run {:?}",
            query
        )))
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("infiniquery=info")),
        )
        .init();

    let args = Args::parse();
    let formatter = create_formatter(args.format);

    match run(&args, &*formatter) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e.to_string()));
            std::process::exit(1);
        }
    }
}

fn run(args: &Args, formatter: &dyn Formatter) -> Result<String, CliError> {
    let service = QueryService::new(JsonCatalogSource::new(&args.catalog), Arc::new(OfflineExecutor))?;
    let caller = args
        .scope
        .iter()
        .fold(CallerContext::from_role_list(&args.roles), |ctx, (name, value)| {
            ctx.with_scope_attribute(name.clone(), value.clone())
        });
    debug!(roles = %caller.role_list(), "Caller context");

    let output = match &args.command {
        Command::Check => {
            let catalog = service.catalog()?;
            format!(
                "Catalog OK: {} entities, find keyword {:?}",
                catalog.entities().len(),
                catalog.find_keyword
            )
        }
        Command::Entities => formatter.format_names("Entity", &service.entity_names(&caller)?),
        Command::Attributes { entity } => {
            formatter.format_names("Attribute", &service.attribute_names(&caller, entity)?)
        }
        Command::Operators { entity, attribute } => formatter.format_names(
            "Operator",
            &service.operator_names(&caller, entity, attribute)?,
        ),
        Command::Separators => formatter.format_names("Separator", &service.condition_separator_names()),
        Command::Values {
            entity,
            attribute,
            operator,
        } => formatter.format_possible_values(&service.possible_values(&caller, entity, attribute, operator)?),
        Command::Compile { file } => {
            let mut query = read_query(file)?;
            let compiled = service.compile_query(&caller, &mut query)?;
            formatter.format_compiled(&compiled)
        }
    };

    Ok(output)
}

/// Read either a bare token array or an `{"tokens": [...]}` object.
fn read_query(path: &Path) -> Result<ExecutableQuery, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_query(&content)
}

fn parse_query(content: &str) -> Result<ExecutableQuery, CliError> {
    let json: serde_json::Value = serde_json::from_str(content)?;
    if json.is_array() {
        let tokens: Vec<LogicalQueryItem> = serde_json::from_value(json)?;
        Ok(ExecutableQuery::new(tokens))
    } else {
        Ok(serde_json::from_value(json)?)
    }
}

fn parse_scope_attribute(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {:?}", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("scope attribute name is empty".to_string());
    }
    Ok((name.to_string(), value.to_string()))
}
