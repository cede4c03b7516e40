//! PlantTaxa CLI - Shop front end for the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and sign in
//! pt-cli register -n "Fern Lover" -e fern@gmail.com -p hunter2
//! pt-cli login -e fern@gmail.com -p hunter2
//!
//! # Browse and fill the cart
//! pt-cli shop --search fern
//! pt-cli cart add 64f1a2
//! pt-cli cart update 64f1a2 3
//! pt-cli cart show
//!
//! # Or order a single plant right away
//! pt-cli buy 64f1a2
//!
//! # Place the order
//! pt-cli checkout -n "Fern Lover" -a "12 Leaf Lane"
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Log filter (default: `planttaxa_shop=info,planttaxa_cli=info`)
//! - `PLANTTAXA_LOG_FORMAT` - `json` for JSON log lines
//!
//! See `planttaxa_shop::config` for the shop's own variables.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use planttaxa_core::ProductId;
use planttaxa_shop::api::ProfileUpdate;
use planttaxa_shop::config::ShopConfig;
use planttaxa_shop::error::AppError;
use planttaxa_shop::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "pt-cli")]
#[command(author, version, about = "PlantTaxa shop from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account (Gmail addresses only)
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
    },
    /// Sign in and keep the session token
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Discard the session token
    Logout,
    /// Show who the stored session belongs to
    Whoami,
    /// Show the signed-in user's profile
    Profile,
    /// Change the signed-in user's phone number or photo
    UpdateProfile {
        /// New phone number
        #[arg(long)]
        phone: Option<String>,

        /// New photo, as an image URL
        #[arg(long)]
        photo: Option<String>,
    },
    /// List plants for sale
    Shop {
        /// Put plants whose name contains this first
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Order one plant immediately, without touching the cart
    Buy {
        /// Catalog product id
        product_id: String,
    },
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for everything in the cart
    Checkout {
        /// Full name for the shipment
        #[arg(short, long)]
        name: String,

        /// Shipping address
        #[arg(short, long)]
        address: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and its total
    Show,
    /// Add one of a plant
    Add {
        /// Catalog product id
        product_id: String,
    },
    /// Remove a plant entirely
    Remove {
        /// Catalog product id
        product_id: String,
    },
    /// Set the quantity of a plant already in the cart
    Update {
        /// Catalog product id
        product_id: String,

        /// New quantity
        quantity: u32,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Command failed");
        commands::report(&e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "planttaxa_shop=info,planttaxa_cli=info".into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if std::env::var("PLANTTAXA_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = ShopConfig::from_env()?;
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Register {
            name,
            email,
            password,
        } => commands::auth::register(&state, &name, &email, &SecretString::from(password)).await?,
        Commands::Login { email, password } => {
            commands::auth::login(&state, &email, &SecretString::from(password)).await?;
        }
        Commands::Logout => commands::auth::logout(&state),
        Commands::Whoami => commands::auth::whoami(&state),
        Commands::Profile => commands::auth::profile(&state).await?,
        Commands::UpdateProfile { phone, photo } => {
            commands::auth::update_profile(&state, ProfileUpdate { phone, photo }).await?;
        }
        Commands::Shop { search } => commands::shop::list(&state, search.as_deref()).await?,
        Commands::Buy { product_id } => {
            commands::shop::buy(&state, &ProductId::new(product_id)).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state),
            CartAction::Add { product_id } => {
                commands::cart::add(&state, &ProductId::new(product_id)).await?;
            }
            CartAction::Remove { product_id } => {
                commands::cart::remove(&state, &ProductId::new(product_id));
            }
            CartAction::Update {
                product_id,
                quantity,
            } => commands::cart::update(&state, &ProductId::new(product_id), quantity),
            CartAction::Clear => commands::cart::clear(&state),
        },
        Commands::Checkout { name, address } => {
            commands::checkout::submit(&state, &name, &address).await?;
        }
    }
    Ok(())
}
