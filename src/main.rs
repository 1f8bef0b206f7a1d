use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use stockroom::config::AppConfig;
use stockroom::export::{export_path, write_history_to_file, write_items_to_file};
use stockroom::logging::{init_logging, OperationTimer};
use stockroom::metrics::MetricsCollector;
use stockroom::models::RegistrationForm;
use stockroom::validation::InputValidator;
use stockroom::{Database, InventoryService, OutputFormat, Session};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (toml, yaml or json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overrides the configured path
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Password again
        #[arg(long)]
        confirm_password: String,
    },
    /// Check credentials and print the user id
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Add an item
    Add {
        /// User id printed by login
        #[arg(short, long)]
        user: i64,

        /// Item name
        name: String,

        /// Initial quantity
        #[arg(allow_hyphen_values = true)]
        quantity: String,
    },
    /// Delete an item
    Remove {
        /// User id printed by login
        #[arg(short, long)]
        user: i64,

        /// Item name
        name: String,
    },
    /// Rename an item
    Rename {
        /// User id printed by login
        #[arg(short, long)]
        user: i64,

        /// Current item name
        from: String,

        /// New item name
        to: String,
    },
    /// Set an item's quantity
    SetQty {
        /// User id printed by login
        #[arg(short, long)]
        user: i64,

        /// Item name
        name: String,

        /// New quantity
        #[arg(allow_hyphen_values = true)]
        quantity: String,
    },
    /// Show the inventory
    List {
        /// User id printed by login
        #[arg(short, long)]
        user: i64,
    },
    /// Show the change history
    History {
        /// User id printed by login
        #[arg(short, long)]
        user: i64,
    },
    /// Show each item's share of the total quantity
    Breakdown {
        /// User id printed by login
        #[arg(short, long)]
        user: i64,
    },
    /// Export the inventory or the history to a file
    Export {
        /// User id printed by login
        #[arg(short, long)]
        user: i64,

        /// What to export
        #[arg(value_enum)]
        what: ExportKind,

        /// Output format (txt, csv or json)
        #[arg(short, long)]
        format: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Inventory,
    History,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load(cli.config.as_deref())?;

    // Initialize logging
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.format == "json",
        config.logging.file_path.as_deref().map(Path::new),
    )?;
    MetricsCollector::init()?;

    info!("Starting stockroom");

    let db_path = cli.database.clone().unwrap_or_else(|| config.database_path());
    InputValidator::validate_database_path(&db_path)?;
    let database = Database::open(&db_path, &config.database)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    let service = InventoryService::new(database).with_alert_threshold(config.inventory.alert_threshold);

    match cli.command {
        Commands::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            let timer = OperationTimer::new("register");
            let user_id = service.register(&RegistrationForm {
                name,
                email,
                password,
                confirm_password,
            })?;
            timer.finish();
            println!("Registration successful. User id: {user_id}");
        },
        Commands::Login { email, password } => match service.login(&email, &password)? {
            Some(session) => println!("Login successful. User id: {} ({})", session.user_id, session.user_name),
            None => anyhow::bail!("Invalid email or password"),
        },
        Commands::Add { user, name, quantity } => {
            let session = open_session(&service, user)?;
            let quantity = InputValidator::parse_quantity(&quantity)?;
            service.add_item(&session, &name, quantity)?;
            println!("Item added successfully");
        },
        Commands::Remove { user, name } => {
            let session = open_session(&service, user)?;
            service.delete_item(&session, &name)?;
            println!("Deleted {name}");
        },
        Commands::Rename { user, from, to } => {
            let session = open_session(&service, user)?;
            service.rename_item(&session, &from, &to)?;
            println!("Renamed '{from}' to '{to}'");
        },
        Commands::SetQty { user, name, quantity } => {
            let session = open_session(&service, user)?;
            let quantity = InputValidator::parse_quantity(&quantity)?;
            let change = service.set_quantity(&session, &name, quantity)?;
            println!("{name}: {} -> {}", change.old_quantity, change.new_quantity);
            if let Some(alert) = change.alert {
                println!("{}", alert.message());
            }
        },
        Commands::List { user } => {
            let session = open_session(&service, user)?;
            for item in service.items(&session)? {
                println!("{:<30} {:>8}", item.name, item.quantity);
            }
        },
        Commands::History { user } => {
            let session = open_session(&service, user)?;
            for entry in service.history(&session)? {
                println!("{}  {:<16} {}", entry.timestamp, entry.user_name, entry.describe());
            }
        },
        Commands::Breakdown { user } => {
            let session = open_session(&service, user)?;
            for share in service.breakdown(&session)? {
                println!("{:<30} {:>8} {:>6.1}%", share.name, share.quantity, share.percent);
            }
        },
        Commands::Export {
            user,
            what,
            format,
            output_dir,
        } => {
            let session = open_session(&service, user)?;
            let format: OutputFormat = format.as_deref().unwrap_or(&config.export.default_format).parse()?;
            let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.export.output_directory));
            let timer = OperationTimer::new("export");
            let (path, rows) = export(&service, &session, what, format, &output_dir)?;
            timer.finish();
            MetricsCollector::default().record_export(format.extension(), rows);
            println!("Exported {rows} rows to {}", path.display());
        },
    }

    Ok(())
}

fn open_session(service: &InventoryService, user_id: i64) -> Result<Session> {
    let session = service
        .session(user_id)
        .with_context(|| format!("No account for user id {user_id}"))?;
    debug!(user_id, inventory_table = session.tables.inventory(), "Session opened");
    Ok(session)
}

fn export(
    service: &InventoryService, session: &Session, what: ExportKind, format: OutputFormat, output_dir: &Path,
) -> Result<(PathBuf, usize)> {
    match what {
        ExportKind::Inventory => {
            let items = service.items(session)?;
            let path = export_path(output_dir, session.tables.inventory(), format)?;
            write_items_to_file(&items, format, &path)?;
            Ok((path, items.len()))
        },
        ExportKind::History => {
            let entries = service.history(session)?;
            let path = export_path(output_dir, session.tables.history(), format)?;
            write_history_to_file(&entries, format, &path)?;
            Ok((path, entries.len()))
        },
    }
}
