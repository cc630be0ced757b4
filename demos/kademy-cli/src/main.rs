//! Kademy CLI - log in to a Kademy backend and browse its catalogue.
//!
//! Credentials persist in the platform config directory between runs, so
//! `kademy login` once and later commands reuse (and refresh) the session.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use kademy::prelude::*;
use tracing::debug;
use url::Url;

/// Command-line client for the Kademy learning platform.
#[derive(Parser)]
#[command(name = "kademy")]
#[command(about = "Log in to Kademy and browse books, quizzes and more")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (overrides KADEMY_API_URL)
    #[arg(long, global = true)]
    api_url: Option<Url>,

    /// Directory holding the stored credentials
    #[arg(long, global = true)]
    token_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Ask the backend to revoke the refresh token on logout
    #[arg(long, global = true)]
    revoke_on_logout: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "KADEMY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account (then log in separately)
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(short, long, env = "KADEMY_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
    },

    /// Show the logged-in user
    Whoami,

    /// Log out and forget the stored credentials
    Logout,

    /// Change the password of the logged-in user
    ChangePassword {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },

    /// Request a password reset email
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },

    /// List a catalogue collection (books, quizzes, assignments, ...)
    List { resource: Resource },

    /// Show one item of a catalogue collection
    Get { resource: Resource, id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Student,
    Teacher,
    InstituteAdmin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Student => Role::Student,
            RoleArg::Teacher => Role::Teacher,
            RoleArg::InstituteAdmin => Role::InstituteAdmin,
        }
    }
}

/// Prints notices to stderr so stdout stays machine-readable.
struct TerminalObserver;

impl SessionObserver for TerminalObserver {
    fn navigate(&self, route: Route) {
        debug!(%route, "navigate");
    }

    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Success => eprintln!("{}", notice.message),
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn build_client(cli: &Cli) -> Result<KademyClient, KademyError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    if let Some(dir) = &cli.token_dir {
        config.token_dir = Some(dir.clone());
    }
    if let Some(secs) = cli.timeout {
        config.request_timeout = Some(Duration::from_secs(secs));
    }
    config.session.revoke_on_logout = cli.revoke_on_logout;

    KademyClient::builder()
        .config(config)
        .observer(TerminalObserver)
        .build()
}

async fn run(cli: Cli) -> Result<(), KademyError> {
    let client = build_client(&cli)?;
    let session = client.session();
    debug!(base_url = %client.base_url(), "connected");

    match cli.command {
        Commands::Login { email, password } => {
            let user = session.login(&email, &password).await?;
            println!("Logged in as {} ({:?})", user.display_name(), user.role);
        }
        Commands::Register {
            email,
            first_name,
            last_name,
            password,
            role,
        } => {
            let request = RegistrationRequest {
                email,
                first_name,
                last_name,
                password_confirm: password.clone(),
                password,
                role: role.map(Role::from),
            };
            session.register(&request).await?;
        }
        Commands::Whoami => match session.check_auth().await? {
            Some(user) => {
                println!("{}", user.display_name());
                println!("  email: {}", user.email);
                println!("  role:  {:?}", user.role);
            }
            None => println!("Not logged in"),
        },
        Commands::Logout => session.logout().await?,
        Commands::ChangePassword { old, new } => {
            let change = PasswordChange {
                old_password: old,
                new_password_confirm: new.clone(),
                new_password: new,
            };
            session.change_password(&change).await?;
        }
        Commands::ForgotPassword { email } => session.request_password_reset(&email).await?,
        Commands::List { resource } => print_json(&client.list(resource).await?),
        Commands::Get { resource, id } => print_json(&client.get(resource, id).await?),
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}
