use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::{LogLevel, Settings};
use core_types::{Customer, CustomerId, SearchTerm};
use database::CustomerRepository;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use web_server::AppState;

/// The main entry point for the Lunchly reservation backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => configuration::load_config_from(path)?,
        None => configuration::load_config()?,
    };
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    let _guard = configuration::init_tracing(&settings.logging)?;

    match cli.command {
        Commands::Serve(args) => {
            if let Some(addr) = args.addr {
                settings.server.host = addr.ip().to_string();
                settings.server.port = addr.port();
            }
            if args.in_memory {
                tracing::warn!("Serving from an in-memory store; data is lost on exit.");
                web_server::serve(AppState::in_memory(), settings.server.socket_addr()?).await
            } else {
                web_server::run_server(&settings).await
            }
        }
        Commands::Customers(command) => {
            let repo = customer_repository(&settings).await?;
            handle_customers(command, &repo).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Customer and reservation backend for the Lunchly restaurant.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of ./lunchly.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured log level (RUST_LOG still wins).
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON API.
    Serve(ServeArgs),
    /// Inspect and edit customers.
    #[command(subcommand)]
    Customers(CustomerCommand),
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to listen on (e.g., "127.0.0.1:3000"). Defaults to the configured one.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Keep customers in process memory instead of PostgreSQL.
    #[arg(long)]
    in_memory: bool,
}

#[derive(Subcommand)]
enum CustomerCommand {
    /// List every customer by last name.
    List,
    /// Show one customer and their reservations.
    Show {
        id: i32,
    },
    /// Look up a customer id by first and last name (e.g., "jane doe").
    Search {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// The ten customers with the most reservations.
    TopTen,
    /// Add a new customer.
    Add(AddCustomerArgs),
}

#[derive(Parser)]
struct AddCustomerArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long, default_value = "")]
    notes: String,
}

// ==============================================================================
// Customer Command Logic
// ==============================================================================

async fn customer_repository(settings: &Settings) -> anyhow::Result<CustomerRepository> {
    let store = Arc::new(web_server::connect_store(settings).await?);
    Ok(CustomerRepository::new(store.clone(), store))
}

async fn handle_customers(command: CustomerCommand, repo: &CustomerRepository) -> anyhow::Result<()> {
    match command {
        CustomerCommand::List => {
            println!("{}", customer_table(&repo.all().await?));
        }
        CustomerCommand::Show { id } => {
            let customer = repo.get(CustomerId(id)).await?;
            println!("{}", customer_table(std::slice::from_ref(&customer)));

            let reservations = repo.reservations(&customer).await?;
            if reservations.is_empty() {
                println!("No reservations.");
            } else {
                let mut table = Table::new();
                table.set_header(vec!["Id", "Starts", "Guests", "Notes"]);
                for reservation in &reservations {
                    table.add_row(vec![
                        reservation.id.map(|id| id.to_string()).unwrap_or_default(),
                        reservation.formatted_start_at(),
                        reservation.num_guests.to_string(),
                        reservation.notes.clone(),
                    ]);
                }
                println!("{table}");
            }
        }
        CustomerCommand::Search { name } => {
            let id = repo.search(&SearchTerm::new(name.join(" "))).await?;
            println!("{id}");
        }
        CustomerCommand::TopTen => {
            println!("{}", customer_table(&repo.top_ten().await?));
        }
        CustomerCommand::Add(args) => {
            let mut customer = Customer::new(args.first_name, args.last_name, args.phone, args.notes);
            repo.save(&mut customer).await?;
            tracing::info!(id = ?customer.id, "Customer added.");
            println!("{}", customer_table(std::slice::from_ref(&customer)));
        }
    }
    Ok(())
}

fn customer_table(customers: &[Customer]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Phone", "Notes"]);
    for customer in customers {
        table.add_row(vec![
            customer.id.map(|id| id.to_string()).unwrap_or_default(),
            customer.full_name(),
            customer.phone.clone().unwrap_or_default(),
            customer.notes.clone(),
        ]);
    }
    table
}
