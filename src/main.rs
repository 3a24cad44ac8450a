use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use tandem_budget::cli::{
    handle_budget_command, handle_category_command, handle_config_command, handle_sector_command,
    handle_transaction_command, BudgetCommands, CategoryCommands, ConfigArgs, SectorCommands,
    TransactionCommands,
};
use tandem_budget::config::{Settings, TandemPaths};
use tandem_budget::storage::{initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "tandem",
    author = "Kaylee Beyene",
    version,
    about = "Shared two-person budgeting across sectors and categories",
    long_about = "Tandem tracks shared spending for two people against a two-level \
                  budget of sectors and categories, per month and per year, with \
                  per-person split budgets and warning thresholds."
)]
struct Cli {
    /// none, error, warn, info, debug, trace (RUST_LOG overrides this)
    #[arg(long, global = true, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Tandem with the default sectors and categories
    Init,

    /// Show or change settings
    Config(ConfigArgs),

    /// Sector management commands
    #[command(subcommand)]
    Sector(SectorCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Budget commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Transaction commands
    #[command(subcommand, alias = "txn")]
    Transaction(TransactionCommands),

    /// Show recent changes from the audit log
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!(
            "tandem_budget={},{}={}",
            level,
            env!("CARGO_CRATE_NAME"),
            level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let paths = TandemPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;
    debug!(base = %paths.base_dir().display(), "resolved data directory");

    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    if !matches!(cli.command, Some(Commands::Init) | None) && !storage.is_initialized() {
        warn!("Tandem is not initialized; run 'tandem init' first");
    }

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing Tandem at: {}", paths.base_dir().display());
            initialize_storage(&paths)?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Default sectors and categories have been created:");
            println!("  - Home (Rent, Utilities, Internet)");
            println!("  - Food (Groceries, Dining Out)");
            println!("  - Transport (Fuel, Public Transit)");
            println!("  - Lifestyle (Entertainment, Subscriptions, Travel)");
            println!("  - Unassigned: Gifts, Medical");
            println!();
            println!("Run 'tandem sector list' to see them.");
        }
        Some(Commands::Config(args)) => {
            handle_config_command(&paths, &mut settings, args)?;
        }
        Some(Commands::Sector(cmd)) => {
            handle_sector_command(&storage, cmd)?;
        }
        Some(Commands::Category(cmd)) => {
            handle_category_command(&storage, cmd)?;
        }
        Some(Commands::Budget(cmd)) => {
            handle_budget_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Transaction(cmd)) => {
            handle_transaction_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Audit { limit }) => {
            let entries = storage.audit().read_recent(limit)?;
            if entries.is_empty() {
                println!("No changes recorded yet.");
            }
            for entry in &entries {
                println!("{}", entry.format_human_readable());
            }
        }
        None => {
            println!("Tandem - shared budgeting for two");
            println!();
            println!("Run 'tandem --help' for usage information.");
            println!("Run 'tandem init' to get started.");
        }
    }

    Ok(())
}
