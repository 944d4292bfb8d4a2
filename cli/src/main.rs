use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use record_store_core::{Catalog, Model, define_model};
use record_store_db::{DEFAULT_CONFIG_FILE, StoreConfig};
use record_store_sqlite::{
    ConnectionContext, DbStatus, Readiness, RecordAccess, StoreError, build_select,
    create_table_sql,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

define_model! {
    /// Demo record: an action code with an optional label.
    #[derive(Debug, Clone, PartialEq, Default, Serialize)]
    pub struct Item {
        action: Integer => "Action",
        name: Text => "Name",
    }
}

#[derive(Debug, Parser)]
#[command(name = "record-store")]
#[command(version)]
#[command(about = "Inspect and edit a record-store database")]
struct Cli {
    /// Configuration file (default: ./record-store.yml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Store file, overriding the configured location.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report store readiness without changing anything.
    Status,
    /// Create the store file and any missing tables.
    Init,
    /// Show the known record shapes and their tables.
    Describe(DescribeArgs),
    /// Query items by example; prints one JSON object per match.
    Get(ItemArgs),
    /// Insert an item; prints true or false.
    Insert(InsertArgs),
    /// Set the given fields on the item with the given id; prints true or false.
    Update(ItemArgs),
}

#[derive(Debug, Args)]
struct DescribeArgs {
    /// Print the shapes as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ItemArgs {
    /// Primary key.
    #[arg(long)]
    id: Option<i64>,
    /// Action code.
    #[arg(long)]
    action: Option<i64>,
    /// Label.
    #[arg(long)]
    name: Option<String>,
}

impl ItemArgs {
    fn into_item(self) -> Item {
        Item {
            id: self.id,
            action: self.action,
            name: self.name,
        }
    }
}

#[derive(Debug, Args)]
struct InsertArgs {
    #[command(flatten)]
    item: ItemArgs,
    /// Skip the insert when a matching item is already stored.
    #[arg(long)]
    if_not_exists: bool,
}

/// Resolved configuration.
struct Settings {
    config: StoreConfig,
    /// An explicitly requested configuration file does not exist.
    config_missing: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = resolve_settings(cli.config.as_deref(), cli.db.as_deref()).and_then(|settings| {
        match cli.command {
            Command::Status => run_status(&settings),
            Command::Init => run_init(&settings),
            Command::Describe(args) => run_describe(args),
            Command::Get(args) => run_get(&settings, args),
            Command::Insert(args) => run_insert(&settings, args),
            Command::Update(args) => run_update(&settings, args),
        }
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn catalog() -> Catalog {
    Catalog::new().register::<Item>()
}

fn resolve_settings(config: Option<&Path>, db: Option<&Path>) -> Result<Settings, String> {
    let path = config.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    let loaded = StoreConfig::load_optional(path)
        .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?;
    let config_missing = loaded.is_none() && config.is_some();
    if loaded.is_none() {
        if config_missing {
            warn!(path = %path.display(), "configuration file not found, using defaults");
        } else {
            info!("no configuration file, using defaults");
        }
    }

    let mut store = loaded.unwrap_or_default();
    if let Some(db) = db {
        store = store.with_file_path(db);
    }
    Ok(Settings {
        config: store,
        config_missing,
    })
}

fn open(settings: &Settings) -> Result<RecordAccess, String> {
    RecordAccess::open(&settings.config, catalog()).map_err(|err| {
        format!(
            "Failed to open store '{}': {err}",
            settings.config.file_path().display()
        )
    })
}

fn run_status(settings: &Settings) -> Result<(), String> {
    let status = if settings.config_missing {
        DbStatus::ConfigNotFound
    } else {
        let connection = ConnectionContext::from_config(&settings.config);
        Readiness::inspect(&connection, &catalog()).status()
    };
    println!("{status}");
    Ok(())
}

fn run_init(settings: &Settings) -> Result<(), String> {
    let access = open(settings)?;
    println!("{}", access.status());
    if let Some(report) = access.bootstrap_report() {
        for table in &report.created {
            println!("created {table}");
        }
        for table in &report.existing {
            println!("exists {table}");
        }
        for table in &report.failed {
            println!("failed {table}");
        }
    }
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<(), String> {
    let catalog = catalog();
    if args.json {
        let json = catalog
            .to_json_pretty()
            .map_err(|err| format!("Failed to serialize catalog: {err}"))?;
        println!("{json}");
        return Ok(());
    }

    for shape in catalog.shapes() {
        let describe_err = |err: StoreError| format!("Failed to describe '{}': {err}", shape.name());
        let create = create_table_sql(shape).map_err(describe_err)?;
        let select = build_select(shape, &[]).map_err(describe_err)?;
        println!("{}", shape.name());
        for field in shape.fields() {
            let key = if field.primary_key { " (primary key)" } else { "" };
            println!("  {}: {}{key}", field.name, field.field_type);
        }
        println!("  {create}");
        println!("  {}", select.display_sql());
    }
    Ok(())
}

fn run_get(settings: &Settings, args: ItemArgs) -> Result<(), String> {
    let access = open(settings)?;
    let items = access
        .try_get(&args.into_item())
        .map_err(|err| format!("Failed to query {}: {err}", Item::table_name()))?;
    for item in items {
        let line = serde_json::to_string(&item)
            .map_err(|err| format!("Failed to serialize item: {err}"))?;
        println!("{line}");
    }
    Ok(())
}

fn run_insert(settings: &Settings, args: InsertArgs) -> Result<(), String> {
    let access = open(settings)?;
    let item = args.item.into_item();
    let inserted = if args.if_not_exists {
        access.insert_if_not_exists(&item)
    } else {
        access.insert(&item)
    };
    println!("{inserted}");
    Ok(())
}

fn run_update(settings: &Settings, args: ItemArgs) -> Result<(), String> {
    let access = open(settings)?;
    println!("{}", access.update(&args.into_item()));
    Ok(())
}
