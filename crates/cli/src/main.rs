//! Casemandu CLI - browse the catalog, build a cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse the phone catalog
//! casemandu brands
//! casemandu models apple
//! casemandu case-types apple "iPhone 15"
//!
//! # Build a cart
//! casemandu cart add-design airpods --artwork art.png
//! casemandu cart add-design laptopsleeves --artwork art.png --height 9.5 --width 13
//! casemandu cart add-case apple "iPhone 15" --case-type "Tough Case" --artwork art.png
//! casemandu cart list
//!
//! # Check out
//! casemandu checkout --name "Sita Sharma" --phone 9800000000 --address Jhamsikhel \
//!     --city Lalitpur --payment-method Khalti --payment-proof proof.jpg
//! ```
//!
//! The cart persists in `CASEMANDU_STATE_DIR` between runs. Uploaded artwork
//! does not; re-attach it at checkout with `--artwork <item-id>=<path>`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use casemandu_core::ItemId;
use casemandu_storefront::order::CustomerDetails;
use casemandu_storefront::{Storefront, StorefrontConfig};
use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;
use commands::checkout::CheckoutOrder;

#[derive(Parser)]
#[command(name = "casemandu")]
#[command(author, version, about = "Casemandu storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List phone brands
    Brands,
    /// List the active models of a brand
    Models {
        /// Brand ID or name
        brand: String,
    },
    /// List the case types available for a model
    CaseTypes {
        /// Brand ID or name
        brand: String,
        /// Model ID or name
        model: String,
    },
    /// List the non-phone designs
    Designs,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Check whether a promo code exists
    Promo {
        code: String,
    },
    /// Place an order for the current cart
    Checkout(CheckoutArgs),
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and its totals
    List,
    /// Add a design (airpods, mousepads, laptopsleeves, popsockets, phonecases)
    AddDesign {
        /// Design title
        design: String,

        /// Artwork image to print
        #[arg(short, long)]
        artwork: PathBuf,

        /// Laptop height in inches (laptop sleeves only)
        #[arg(long)]
        height: Option<f64>,

        /// Laptop width in inches (laptop sleeves only)
        #[arg(long)]
        width: Option<f64>,
    },
    /// Add a phone case
    AddCase {
        /// Brand ID or name
        brand: String,

        /// Model ID or name
        model: String,

        /// Case type ID or name (default: the first one offered)
        #[arg(short, long)]
        case_type: Option<String>,

        /// Artwork image to print
        #[arg(short, long)]
        artwork: PathBuf,
    },
    /// Remove an item (asks for confirmation)
    Remove {
        /// Item ID as shown by `cart list`
        id: ItemId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove everything from the cart
    Clear,
}

#[derive(Args)]
struct CheckoutArgs {
    /// Customer name
    #[arg(long, default_value = "")]
    name: String,

    /// Customer email
    #[arg(long, default_value = "")]
    email: String,

    /// Customer phone number
    #[arg(long, default_value = "")]
    phone: String,

    /// Shipping address
    #[arg(long, default_value = "")]
    address: String,

    /// City or district
    #[arg(long, default_value = "")]
    city: String,

    /// Additional delivery instructions
    #[arg(long, default_value = "")]
    info: String,

    /// Payment channel the proof was made with (e.g. Khalti, eSewa)
    #[arg(long)]
    payment_method: String,

    /// Screenshot of the payment
    #[arg(long)]
    payment_proof: PathBuf,

    /// Promo code to apply
    #[arg(long)]
    promo: Option<String>,

    /// Re-attach artwork to a cart item, as `<item-id>=<path>`
    #[arg(long, value_parser = commands::checkout::parse_artwork_binding)]
    artwork: Vec<(ItemId, PathBuf)>,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "casemandu_storefront=info,casemandu=info".into());

    // CASEMANDU_LOG_FORMAT=json for structured log collection
    let is_json =
        std::env::var("CASEMANDU_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing();

    let result = run(cli, config).await;
    if let Err(e) = &result {
        e.report();
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Error: {}", e.user_message());
        }
    }

    // Flush pending Sentry events before exiting
    drop(sentry_guard);
    if result.is_err() {
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    let mut storefront = Storefront::open(config)?;

    match cli.command {
        Commands::Brands => commands::catalog::brands(storefront.client()).await,
        Commands::Models { brand } => commands::catalog::models(storefront.client(), &brand).await?,
        Commands::CaseTypes { brand, model } => {
            commands::catalog::case_types(storefront.client(), &brand, &model).await?;
        }
        Commands::Designs => commands::catalog::designs(),
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&storefront),
            CartAction::AddDesign {
                design,
                artwork,
                height,
                width,
            } => {
                commands::cart::add_design(&mut storefront, &design, &artwork, height, width)
                    .await?;
            }
            CartAction::AddCase {
                brand,
                model,
                case_type,
                artwork,
            } => {
                commands::cart::add_case(
                    &mut storefront,
                    &brand,
                    &model,
                    case_type.as_deref(),
                    &artwork,
                )
                .await?;
            }
            CartAction::Remove { id, yes } => commands::cart::remove(&mut storefront, &id, yes).await?,
            CartAction::Clear => commands::cart::clear(&mut storefront),
        },
        Commands::Promo { code } => commands::checkout::promo(storefront.client(), &code).await,
        Commands::Checkout(args) => {
            let order = CheckoutOrder {
                customer: CustomerDetails {
                    name: args.name,
                    email: args.email,
                    phone: args.phone,
                    shipping_address: args.address,
                    city: args.city,
                    additional_info: args.info,
                },
                payment_method: args.payment_method,
                payment_proof: args.payment_proof,
                promo: args.promo,
                artwork: args.artwork,
            };
            commands::checkout::checkout(&mut storefront, order).await?;
        }
    }

    Ok(())
}
