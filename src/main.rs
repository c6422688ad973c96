use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use medbook_lib::config::{self, ServerConfig};
use medbook_lib::models::constants::constants_table;
use medbook_lib::models::MedicineRecord;
use medbook_lib::{api, core_state, init_tracing, validation};

#[derive(Parser)]
#[command(name = "medbook")]
#[command(version, about = "Personal medication tracking service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (MEDBOOK_BIND, MEDBOOK_PORT, MEDBOOK_DB)
    Serve,
    /// Mint a bearer token for a user; printed once
    IssueToken {
        #[arg(long)]
        user: String,
        /// Expire after this many days (default: never)
        #[arg(long)]
        ttl_days: Option<u32>,
    },
    /// Revoke every token belonging to a user
    RevokeTokens {
        #[arg(long)]
        user: String,
    },
    /// Check a medicine record JSON file; exit status 1 when invalid
    Validate { file: PathBuf },
    /// Print the domain constants table as JSON
    Constants,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve => serve().await,
        Commands::IssueToken { user, ttl_days } => issue_token(&user, ttl_days),
        Commands::RevokeTokens { user } => revoke_tokens(&user),
        Commands::Validate { file } => return validate_file(&file),
        Commands::Constants => print_constants(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

async fn serve() -> CliResult {
    let config = ServerConfig::from_env()?;
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    let core = core_state::init(&config)?;
    api::server::serve(&config, core).await?;
    Ok(())
}

fn issue_token(user: &str, ttl_days: Option<u32>) -> CliResult {
    let core = core_state::init(&ServerConfig::from_env()?)?;
    let ttl = ttl_days.map(|days| chrono::Duration::days(i64::from(days)));
    let token = core.identity.issue_token(user, ttl)?;
    println!("{token}");
    Ok(())
}

fn revoke_tokens(user: &str) -> CliResult {
    let core = core_state::init(&ServerConfig::from_env()?)?;
    let count = core.identity.revoke_user_tokens(user)?;
    println!("Revoked {count} token(s) for {user}");
    Ok(())
}

fn validate_file(path: &Path) -> ExitCode {
    let record: MedicineRecord = match std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()))
    {
        Ok(record) => record,
        Err(e) => {
            eprintln!("Cannot read {}: {e}", path.display());
            return ExitCode::from(2);
        }
    };

    let errors = validation::validate(&record);
    match serde_json::to_string_pretty(&errors) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
    if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn print_constants() -> CliResult {
    println!("{}", serde_json::to_string_pretty(&constants_table())?);
    Ok(())
}
