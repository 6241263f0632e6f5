#![cfg(not(tarpaulin_include))]

use clap::{Parser, Subcommand};
use orders_dashboard::access;
use orders_dashboard::tokens::ttl_from_hours;
use orders_dashboard::{Config, Mode, RecordStore, Role, TokenRegistry};
use std::process::ExitCode;

/// Operator commands for the orders dashboard data files.
#[derive(Debug, Parser)]
#[command(name = "orders-cli")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the orders and tokens files if they are missing
    Seed,
    /// Issue a token for the configured company and print its share link
    Issue {
        #[arg(long, default_value = "editor")]
        role: String,
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
    /// Show what access a token grants right now
    Check { token: String },
    /// List every token row
    Tokens,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> orders_dashboard::Result<()> {
    let config = cli.config;
    let registry = TokenRegistry::new(config.tokens_path());

    match cli.command {
        Command::Seed => {
            let store = RecordStore::new(config.orders_path());
            match store.seed_if_missing()? {
                Some(rows) => println!("Seeded {} orders into {}", rows, store.path().display()),
                None => println!("{} already exists", store.path().display()),
            }
            registry.ensure_file()?;
        }
        Command::Issue { role, hours } => {
            let role: Role = role.parse()?;
            let ttl = ttl_from_hours(hours)?;
            let issued = registry.issue(role, &config.client_company, ttl)?;
            println!("token:   {}", issued.token);
            println!("role:    {}", issued.role);
            println!("company: {}", issued.company);
            println!("expires: {}", issued.expires_at);
            println!("link:    {}", config.share_link(&issued.token));
        }
        Command::Check { token } => {
            let resolved = access::resolve(&config, &registry, None, Some(&token));
            if resolved.mode == Mode::Client {
                println!("valid: {} for {}", resolved.role, resolved.company);
            } else {
                println!("invalid");
            }
        }
        Command::Tokens => {
            for row in registry.list()? {
                println!(
                    "{}  {:<6}  {}  expires {}",
                    row.token, row.role, row.company, row.expires_at
                );
            }
        }
    }
    Ok(())
}
