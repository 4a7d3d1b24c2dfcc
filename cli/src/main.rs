use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use constellation::Client;
use constellation::config::{ClientConfig, ConfigError};
use constellation::net::error::ApiError;
use constellation::net::types::{LoginRequest, RegisterRequest};
use constellation::router::guard::GuardError;
use constellation::state::session::{Principal, SessionError};
use constellation::token_store::{FileTokenStore, TokenStore, TokenStoreError};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] TokenStoreError),
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E_CONFIG",
            Self::Api(e) | Self::Session(SessionError::Api(e)) => e.error_code(),
            Self::Storage(_) | Self::Session(SessionError::Storage(_)) => "E_TOKEN_STORAGE",
            Self::Guard(_) => "E_REDIRECT_LOOP",
            Self::Json(_) => "E_JSON",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "constellation", about = "Constellation session and route-guard CLI")]
struct Cli {
    /// Takes precedence over `CONSTELLATION_API_BASE_URL`.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[arg(long, global = true, env = "CONSTELLATION_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query backend health.
    Health,
    /// Log in and persist the bearer credential.
    Login(LoginArgs),
    /// Create an account and persist its bearer credential.
    Register(RegisterArgs),
    /// Revalidate the stored credential and print the principal.
    Whoami,
    /// Forget the stored credential.
    Logout,
    /// Run the navigation guard against a path.
    Navigate { path: String },
    /// Print the route table.
    Routes,
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,

    #[arg(long, env = "CONSTELLATION_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long)]
    organization: Option<String>,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[command(flatten)]
    credentials: LoginArgs,

    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: ignoring .env: {e}");
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {e}", e.error_code());
            std::process::ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env_with_base_url(cli.base_url.as_deref())?;
    if let Some(token_file) = &cli.token_file {
        config.token_path.clone_from(token_file);
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    tracing::debug!(api_base_url = %config.api_base_url, token_path = %config.token_path.display(), "config loaded");
    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let client = Client::with_token_store(&config, tokens)?;

    match cli.command {
        Command::Health => {
            let health = client.health.current().await?;
            print_json(&serde_json::to_value(health)?)
        }
        Command::Login(args) => {
            let principal = client.session.login(&login_request(args)).await?;
            print_json(&principal_json(&principal))
        }
        Command::Register(args) => {
            let principal = client.session.register(&register_request(args)).await?;
            print_json(&principal_json(&principal))
        }
        Command::Whoami => run_whoami(&client).await,
        Command::Logout => {
            client.session.logout()?;
            print_json(&json!({ "authenticated": false }))
        }
        Command::Navigate { path } => {
            let resolution = client.guard.navigate(&path).await?;
            let hops: Vec<Value> = resolution
                .hops
                .iter()
                .map(|hop| json!({ "from": hop.from, "to": hop.to, "reason": format!("{:?}", hop.reason) }))
                .collect();
            print_json(&json!({
                "requested": path,
                "final": resolution.full_path,
                "route": resolution.route.name,
                "hops": hops,
            }))
        }
        Command::Routes => {
            let routes: Vec<Value> = client
                .guard
                .routes()
                .routes()
                .iter()
                .map(|r| {
                    json!({
                        "name": r.name,
                        "path": r.path,
                        "requires_auth": r.requires_auth,
                        "permission": r.permission,
                    })
                })
                .collect();
            print_json(&Value::Array(routes))
        }
    }
}

async fn run_whoami(client: &Client) -> Result<(), CliError> {
    if client.tokens.get().is_none() {
        return print_json(&json!({ "authenticated": false }));
    }
    match client.session.load_profile().await {
        Ok(Some(principal)) => print_json(&principal_json(&principal)),
        Ok(None) => print_json(&json!({ "authenticated": false })),
        Err(e) => {
            tracing::warn!(error = %e, "stored credential rejected; forcing logout");
            client.session.logout()?;
            Err(e.into())
        }
    }
}

fn login_request(args: LoginArgs) -> LoginRequest {
    LoginRequest { email: args.email, password: args.password, organization: args.organization }
}

fn register_request(args: RegisterArgs) -> RegisterRequest {
    RegisterRequest {
        email: args.credentials.email,
        password: args.credentials.password,
        organization: args.credentials.organization,
        first_name: args.first_name,
        last_name: args.last_name,
    }
}

fn principal_json(principal: &Principal) -> Value {
    let permissions: Vec<&str> = principal.permissions.iter().collect();
    json!({
        "authenticated": true,
        "user": principal.user,
        "display_name": principal.user.display_name(),
        "roles": principal.roles,
        "permissions": permissions,
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
