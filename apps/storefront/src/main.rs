//! # Harvest Hub Storefront
//!
//! Terminal shell over the storefront client.
//!
//! ```text
//! storefront products
//! storefront signin <email> <password>
//! storefront checkout <cod|card> <address...>
//! storefront track <pickup address> <delivery address>
//! ```
//!
//! Configuration is read from the platform config dir (`storefront.toml`)
//! or the file named by `HARVEST_CONFIG`, then `HARVEST_*` env overrides.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use harvest_client::{
    CartState, CheckoutOrchestrator, ClientConfig, Credential, CredentialStore, Dispatcher,
    InMemoryCredentialStore, PaymentConfirmer,
};
use harvest_core::{format_inr, CartItem, PaymentMethod, PaymentOrder};

/// Seeded customer of the mock backend.
const DEMO_EMAIL: &str = "customer@test.com";
const DEMO_PASSWORD: &str = "123456";

const USAGE: &str = "usage: storefront <products | signin <email> <password> | \
checkout <cod|card> <address...> | track <pickup> <delivery>>";

/// Prints the amount and approves it.
struct ConsoleConfirm;

#[async_trait]
impl PaymentConfirmer for ConsoleConfirm {
    async fn confirm(&self, order: &PaymentOrder) -> bool {
        println!("Confirming card payment of {}", format_inr(order.amount));
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config_path = std::env::var("HARVEST_CONFIG").ok().map(PathBuf::from);
    let config = ClientConfig::load(config_path)?;
    info!(mode = %config.mode(), base_url = %config.api.base_url, "Configuration loaded");

    let credentials = Arc::new(InMemoryCredentialStore::new());
    let dispatcher = Arc::new(Dispatcher::from_config(&config, credentials.clone())?);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("products") => list_products(&dispatcher).await?,
        Some("signin") if args.len() == 3 => {
            sign_in(&dispatcher, credentials.as_ref(), &args[1], &args[2]).await?;
        }
        Some("checkout") if args.len() >= 3 => {
            let method: PaymentMethod = args[1].parse()?;
            let address = args[2..].join(" ");
            checkout(&config, dispatcher, credentials.as_ref(), method, &address).await?;
        }
        Some("track") if args.len() == 3 => {
            let tracking = dispatcher.track_delivery(&args[1], &args[2]).await?;
            match tracking.estimate() {
                Some(estimate) => println!(
                    "{:?}: {} ({})",
                    tracking.status, estimate.distance_text, estimate.duration_text
                ),
                None => println!("{:?}: route unavailable", tracking.status),
            }
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG=harvest_client=debug` shows dispatch and checkout transitions.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn list_products(dispatcher: &Dispatcher) -> Result<(), Box<dyn Error>> {
    for product in dispatcher.get_products().await? {
        println!(
            "{:>3}  {:<24} {:<12} {}",
            product.product_id,
            product.name,
            product.category,
            format_inr(product.price)
        );
    }
    Ok(())
}

async fn sign_in(
    dispatcher: &Dispatcher,
    credentials: &dyn CredentialStore,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn Error>> {
    let response = dispatcher.sign_in(email, password).await?;
    match Credential::from_auth_response(&response) {
        Some(credential) => {
            println!("Signed in as {} ({})", credential.user.name, credential.user.user_type);
            credentials.set(credential);
        }
        None => {
            let message = response.message.unwrap_or_else(|| "Sign in failed".to_string());
            warn!(email, "Sign in rejected");
            println!("{}", message);
        }
    }
    Ok(())
}

/// Signs in as the demo customer, fills the cart with the first two
/// products and checks out.
async fn checkout(
    config: &ClientConfig,
    dispatcher: Arc<Dispatcher>,
    credentials: &dyn CredentialStore,
    method: PaymentMethod,
    address: &str,
) -> Result<(), Box<dyn Error>> {
    sign_in(&dispatcher, credentials, DEMO_EMAIL, DEMO_PASSWORD).await?;

    let cart = CartState::new();
    for product in dispatcher.get_products().await?.iter().take(2) {
        cart.add(CartItem::from_product(product));
    }

    let totals = cart.totals();
    println!("Subtotal {}", format_inr(totals.subtotal));
    println!("Shipping {}", format_inr(totals.shipping));
    println!("Tax      {}", format_inr(totals.tax));
    println!("Total    {}", format_inr(totals.total));

    let orchestrator = CheckoutOrchestrator::new(dispatcher, cart, Arc::new(ConsoleConfirm))
        .with_currency(config.currency());
    let outcome = orchestrator.checkout(address, method).await?;

    println!(
        "Order #{} placed ({:?}), {}",
        outcome.order.order_id,
        outcome.order.status,
        format_inr(outcome.order.total_amount)
    );
    if let Some(payment) = outcome.payment {
        if !payment.recorded {
            println!("Payment succeeded but could not be recorded");
        }
    }
    Ok(())
}
