//! Finance Agent - command-line client
//!
//! Signs in against the Finance Agent backend, manages stock holdings and
//! requests AI-generated advice. The session survives between runs in a
//! local SQLite store.

use clap::Parser;
use finagent_core::{Advice, ClientConfig, Holding, User};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod error;
mod state;
mod viewmodel;

use cli::{Cli, Commands, HoldingsCommand};
use error::Result;
use state::AppState;
use viewmodel::{AdviceViewModel, AuthViewModel, HoldingsViewModel};

fn main() {
    // Pick up FINANCE_AGENT_API_URL and friends from .env
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    }
    .with_api_url_override(cli.api_url.clone());

    let state = AppState::new(config)?;
    let auth = AuthViewModel::new(state.api.clone());
    tracing::debug!(
        api = %state.config.api_url,
        authenticated = state.session.is_authenticated(),
        "Dispatching command"
    );

    let result = dispatch(&state, &auth, cli.command).await;

    if state.take_redirect() {
        println!("Your session has expired. Sign in again with `finagent signin`.");
    }
    result
}

async fn dispatch(state: &AppState, auth: &AuthViewModel, command: Commands) -> Result<()> {
    // Landing commands bounce an already signed-in user
    if matches!(command, Commands::Signup { .. } | Commands::Signin { .. }) {
        if let (true, Some(user)) = (auth.check_auth_status(), auth.current_user()) {
            println!(
                "Already signed in as {}. Run `finagent signout` to switch accounts.",
                user.username
            );
            return Ok(());
        }
    }

    let user = if command.requires_session() {
        Some(auth.require_session()?)
    } else {
        None
    };

    match command {
        Commands::Signup {
            name,
            email,
            password,
        } => {
            let user = auth.create_account(&name, &email, &password).await?;
            println!("Account created.");
            print_user(&user);
        }

        Commands::Signin { username, password } => {
            let user = auth.sign_in(&username, &password).await?;
            println!("Signed in as {}.", user.username);
        }

        Commands::Signout => {
            auth.sign_out()?;
            println!("Signed out.");
        }

        Commands::Profile { refresh } => {
            let user = if refresh {
                auth.refresh_profile().await?
            } else {
                auth.current_user().ok_or(error::AppError::NotSignedIn)?
            };
            print_user(&user);
        }

        Commands::Holdings(sub) => {
            let user = user.ok_or(error::AppError::NotSignedIn)?;
            let holdings = HoldingsViewModel::new(state.api.clone(), user.id);

            match sub {
                HoldingsCommand::List => {
                    holdings.refresh().await?;
                }
                HoldingsCommand::Add { ticker } => {
                    let created = holdings.add(&ticker).await?;
                    println!("Added {}.", created.stock);
                }
                HoldingsCommand::Remove { ticker } => {
                    let stock = ticker.trim().to_uppercase();
                    holdings.refresh().await?;
                    let response = holdings.delete(&stock).await?;
                    println!("{}", response.message);
                }
            }

            print_holdings(&holdings.holdings().unwrap_or_default());
        }

        Commands::Advice => {
            let user = user.ok_or(error::AppError::NotSignedIn)?;
            let advice = AdviceViewModel::new(state.api.clone(), user.id);
            advice.generate().await?;
            if let Some(latest) = advice.latest() {
                print_advice(&latest);
            }
        }
    }

    Ok(())
}

fn print_user(user: &User) {
    println!("  Username: {}", user.username);
    println!("  Email:    {}", user.email);
    println!("  User ID:  {}", user.id);
    if let Some(created_at) = &user.created_at {
        println!("  Joined:   {}", created_at);
    }
}

fn print_holdings(holdings: &[Holding]) {
    if holdings.is_empty() {
        println!("No holdings yet. Add one with `finagent holdings add <TICKER>`.");
        return;
    }

    println!("{:<10} {:>10}", "STOCK", "QUANTITY");
    for holding in holdings {
        println!("{:<10} {:>10}", holding.stock, holding.quantity);
    }
}

fn print_advice(advice: &Advice) {
    match advice.generated_at_utc() {
        Some(at) => println!(
            "Generated {}",
            at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        ),
        None => println!("Generated {}", advice.generated_at),
    }
    println!();
    println!("{}", advice.advice);
}
