//! Storefront cart demo
//!
//! Walks one customer through the cart:
//! - Opening the tenant's cart from a file-backed store
//! - Adding catalog entries and changing quantities
//! - Copying a share link and opening it on a "second device"
//! - Checking out over WhatsApp
//!
//! # Usage
//!
//! ```bash
//! # Cart file defaults to the system temp directory
//! cargo run --features demo --bin cart-demo -- /tmp/cart.json
//!
//! # Another storefront
//! STOREFRONT_DEFAULT_TENANT=runa cargo run --features demo --bin cart-demo
//! ```

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use storefront_cart::checkout::format_price;
use storefront_cart::prelude::*;
use storefront_cart::{PersistenceAdapter, register_metrics};
use storefront_core::environment::{Clock, SystemClock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn catalog() -> StaticCatalog {
    StaticCatalog::new([
        CatalogEntry::new("gaming-package", "Paket Gaming", 45_000)
            .with_description("PS4 + Snack + Minuman")
            .with_feature("2 jam gaming PS4")
            .with_feature("Snack ringan gratis"),
        CatalogEntry::new("photo-session", "Sesi Foto", 350_000)
            .with_description("Studio + Copy digital")
            .with_stock(StockStatus::SoldOut),
        CatalogEntry::new("kopi-susu", "Kopi Susu", 15_000),
    ])
}

fn open_cart(
    config: &StorefrontConfig,
    storage: Arc<dyn DurableStorage>,
    location: Arc<dyn Location>,
) -> CartStore {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let persistence = PersistenceAdapter::new(storage, location, Arc::clone(&clock))
        .with_keys(config.cart.keys());
    let env = CartEnvironment::new(Arc::new(persistence), clock);
    CartStore::open_for(env, config.cart.tenant())
}

fn print_cart(cart: &CartStore) {
    cart.read(|state| {
        for item in &state.items {
            println!(
                "   • {} x{} @ {}",
                item.service.name,
                item.quantity,
                format_price(item.service.price)
            );
        }
    });
    println!(
        "   {} unit(s), total {}\n",
        cart.count(),
        format_price(cart.total())
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_cart=debug,storefront_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    register_metrics();

    let config = StorefrontConfig::from_env().context("invalid storefront configuration")?;
    let cart_file = std::env::args()
        .nth(1)
        .map_or_else(|| std::env::temp_dir().join("storefront-cart.json"), PathBuf::from);

    println!("\n🛒 Storefront cart demo");
    println!("   Tenant: {}", config.cart.tenant());
    println!("   Cart file: {}\n", cart_file.display());

    // ========== Customer device ==========

    let storage = FileStorage::new(&cart_file);
    let location = InMemoryLocation::new(config.base_url()?);
    let cart = open_cart(&config, Arc::new(storage), Arc::new(location.clone()));
    println!("1️⃣  Opened cart ({:?})", cart.load_origin());
    print_cart(&cart);

    let catalog = catalog();
    for id in ["gaming-package", "kopi-susu", "gaming-package", "photo-session"] {
        let id = ServiceId::new(id);
        match catalog.orderable(&id) {
            Some(service) => cart.add_item(service),
            None => println!("   ✗ {id} is not available"),
        }
    }
    cart.update_quantity("kopi-susu", 3);
    println!("2️⃣  Added items");
    print_cart(&cart);
    println!("   Address bar: {}\n", location.href());

    let clipboard = InMemoryClipboard::new();
    let share = ShareFacade::for_store(&cart, clipboard.clone(), NoClipboard);
    let status = config.share.status();
    if share.share(&cart, &status).await {
        println!("3️⃣  Share link copied (success flag: {})", status.share_success());
    } else {
        println!("3️⃣  Share link could not be copied");
    }
    let link = clipboard.contents().unwrap_or_default();
    println!("   {link}\n");

    // ========== Friend's device ==========

    let friend_location = InMemoryLocation::parse(&link)?;
    let friend = open_cart(
        &config,
        Arc::new(InMemoryStorage::new()),
        Arc::new(friend_location.clone()),
    );
    let notice = SharedLinkNotice::new();
    println!("4️⃣  Friend opened the link ({:?})", friend.load_origin());
    if let Some(notice) = notice.check(&friend) {
        println!("   🔔 {}: {}", notice.title, notice.description);
    }
    println!("   Address bar after notice: {}", friend_location.href());
    print_cart(&friend);

    // ========== Checkout ==========

    let checkout = Checkout::new(config.whatsapp.clone());
    println!("5️⃣  Order message:\n{}\n", checkout.message(&friend));
    match checkout.place_order(&friend) {
        Some(link) => println!("   Open {link}"),
        None => println!("   Nothing to order"),
    }
    println!("   Friend's cart is now empty: {}\n", friend.state().is_empty());

    println!("✓ Customer cart persisted to {}", cart_file.display());
    Ok(())
}
