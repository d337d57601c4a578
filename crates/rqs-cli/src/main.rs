use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rqs")]
#[command(about = "Requisition service operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Release requisitions as orders (any status -> RELEASED), in the order given.
    Release {
        /// Requisition ids, comma separated
        #[arg(long, required = true, value_delimiter = ',')]
        ids: Vec<String>,

        /// Acknowledge that release is terminal and is not rolled back on a later failure.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },

    /// Order utilities
    Order {
        #[command(subcommand)]
        cmd: OrderCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations. Guardrail: refuses when requisitions are in flight
    /// (SUBMITTED/AUTHORIZED/APPROVED) unless --yes is provided.
    Migrate {
        /// Acknowledge you are migrating a DB with requisitions awaiting approval.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum OrderCmd {
    /// Print an order as CSV (productName, filledQuantity, orderedQuantity)
    Csv {
        /// Order id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = rqs_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = rqs_db::status(&pool).await?;
                    println!(
                        "db_ok={} has_requisitions_table={}",
                        s.ok, s.has_requisitions_table
                    );
                }
                DbCmd::Migrate { yes } => {
                    let n = rqs_db::count_in_flight_requisitions(&pool).await?;
                    if n > 0 && !yes {
                        anyhow::bail!(
                            "REFUSING MIGRATE: detected {} requisition(s) in SUBMITTED/AUTHORIZED/APPROVED. Re-run with: `rqs db migrate --yes`",
                            n
                        );
                    }

                    rqs_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = rqs_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Release { ids, yes } => {
            commands::release::run(&ids, yes).await?;
        }

        Commands::Order { cmd } => match cmd {
            OrderCmd::Csv { id } => {
                commands::order::csv(&id).await?;
            }
        },
    }

    Ok(())
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
