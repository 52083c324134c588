//! Integration tests for cart persistence across durable storage and the URL
//!
//! Every test opens a real `CartStore` over in-memory or mock providers and
//! inspects what landed in storage and in the address bar.

#![allow(clippy::unwrap_used)] // Test code

use std::sync::Arc;
use storefront_cart::codec::{self, SerializedCart};
use storefront_cart::mocks::{FailingLocation, FailingStorage};
use storefront_cart::prelude::*;
use storefront_cart::{CartKeys, StorageError};
use storefront_testing::{test_clock, test_time};
use url::Url;

// ============================================================================
// Fixtures
// ============================================================================

fn gaming() -> Service {
    Service::new("gaming-package", "Paket Gaming", 45_000)
}

fn coffee() -> Service {
    Service::new("kopi-susu", "Kopi Susu", 15_000)
}

fn open(
    storage: impl DurableStorage + 'static,
    location: impl Location + 'static,
    tenant: &str,
) -> CartStore {
    let env = CartEnvironment::with_providers(
        Arc::new(storage),
        Arc::new(location),
        Arc::new(test_clock()),
    );
    CartStore::open_for(env, Tenant::new(tenant))
}

fn durable_record(items: &[CartItem]) -> String {
    SerializedCart::from_items(items, test_time()).to_json().unwrap()
}

fn stored_items(storage: &InMemoryStorage, tenant: &str) -> Vec<CartItem> {
    let key = CartKeys::default().storage_key(&Tenant::new(tenant));
    let record = storage.get(&key).unwrap();
    SerializedCart::parse(&record).unwrap().into_items(test_time())
}

// ============================================================================
// Initialization
// ============================================================================

#[test]
fn shared_link_wins_over_durable_cart() {
    let storage = InMemoryStorage::new();
    storage
        .set_item(
            "chill6_cart",
            &durable_record(&[CartItem::new(gaming(), 1, test_time())]),
        )
        .unwrap();
    let token = codec::encode_at(&[CartItem::new(coffee(), 3, test_time())], test_time());
    let location = InMemoryLocation::parse(&format!("https://shop.test/?cart={token}")).unwrap();

    let cart = open(storage.clone(), location, "main");

    assert_eq!(cart.load_origin(), LoadOrigin::FromSharedLink);
    assert_eq!(cart.state().items, vec![CartItem::new(coffee(), 3, test_time())]);
    assert_eq!(stored_items(&storage, "main"), cart.state().items);
}

#[test]
fn durable_cart_loads_without_link() {
    let storage = InMemoryStorage::new();
    storage
        .set_item(
            "chill6_cart",
            &durable_record(&[CartItem::new(gaming(), 2, test_time())]),
        )
        .unwrap();
    let location = InMemoryLocation::parse("https://shop.test/").unwrap();

    let cart = open(storage, location.clone(), "main");

    assert_eq!(cart.load_origin(), LoadOrigin::FromDurable);
    assert_eq!(cart.count(), 2);
    assert_eq!(location.replacements(), 0);
}

#[test]
fn corrupt_channels_open_an_empty_cart() {
    let storage = InMemoryStorage::new();
    storage.set_item("chill6_cart", "{not json").unwrap();
    let location = InMemoryLocation::parse("https://shop.test/?cart=%%%").unwrap();

    let cart = open(storage, location, "main");

    assert_eq!(cart.load_origin(), LoadOrigin::FreshEmpty);
    assert!(cart.state().is_empty());
}

// ============================================================================
// Mutations
// ============================================================================

#[test]
fn every_mutation_lands_in_both_channels() {
    let storage = InMemoryStorage::new();
    let location = InMemoryLocation::parse("https://shop.test/services?ref=ig#menu").unwrap();
    let cart = open(storage.clone(), location.clone(), "main");

    cart.add_item(gaming());
    cart.add_item(coffee());
    cart.add_item(gaming());
    cart.update_quantity("kopi-susu", 4);

    let expected = cart.state().items;
    assert_eq!(stored_items(&storage, "main"), expected);

    let token = location.query_param("cart").unwrap();
    assert_eq!(codec::decode_at(&token, test_time()), expected);
    assert_eq!(location.query_param("ref").as_deref(), Some("ig"));
    assert!(location.href().ends_with("#menu"));
}

#[test]
fn quantity_floor_removes_the_line_everywhere() {
    let storage = InMemoryStorage::new();
    let location = InMemoryLocation::parse("https://shop.test/").unwrap();
    let cart = open(storage.clone(), location.clone(), "main");

    cart.add_item(gaming());
    cart.update_quantity("gaming-package", 0);

    assert!(cart.state().is_empty());
    assert!(stored_items(&storage, "main").is_empty());
    assert_eq!(location.query_param("cart"), None);
}

#[test]
fn clear_removes_durable_key_and_url_param() {
    let storage = InMemoryStorage::new();
    let location = InMemoryLocation::parse("https://shop.test/?page=2").unwrap();
    let cart = open(storage.clone(), location.clone(), "runa");

    cart.add_item(coffee());
    assert!(storage.contains_key("chill6_cart_runa"));

    cart.clear();

    assert!(cart.state().is_empty());
    assert_eq!(cart.tenant(), Tenant::new("runa"));
    assert!(!storage.contains_key("chill6_cart_runa"));
    assert_eq!(location.href(), "https://shop.test/?page=2");
}

#[test]
fn listener_dispatch_keeps_channels_in_sync() {
    let storage = InMemoryStorage::new();
    let location = InMemoryLocation::parse("https://shop.test/").unwrap();
    let cart = open(storage.clone(), location.clone(), "main");

    let upsell = cart.clone();
    let _subscription = cart.subscribe(move |state: &CartState| {
        let first_gaming = matches!(
            state.items.as_slice(),
            [only] if only.id().as_str() == "gaming-package" && only.quantity == 1
        );
        if first_gaming {
            upsell.add_item(coffee());
        }
    });

    cart.add_item(gaming());

    let expected = cart.state().items;
    assert_eq!(expected.len(), 2);
    assert_eq!(stored_items(&storage, "main"), expected);
    let token = location.query_param("cart").unwrap();
    assert_eq!(codec::decode_at(&token, test_time()), expected);
}

#[test]
fn concurrent_senders_leave_the_final_cart_stored() {
    let storage = InMemoryStorage::new();
    let location = InMemoryLocation::parse("https://shop.test/").unwrap();
    let cart = open(storage.clone(), location.clone(), "main");

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let cart = cart.clone();
            std::thread::spawn(move || {
                for n in 0..10 {
                    cart.add_item(Service::new(format!("svc-{worker}-{n}"), "Layanan", 1_000));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let expected = cart.state().items;
    assert_eq!(expected.len(), 40);
    assert_eq!(stored_items(&storage, "main"), expected);
    let token = location.query_param("cart").unwrap();
    assert_eq!(codec::decode_at(&token, test_time()), expected);
}

// ============================================================================
// Tenants
// ============================================================================

#[test]
fn tenants_do_not_share_carts() {
    let storage = InMemoryStorage::new();
    let location = InMemoryLocation::parse("https://shop.test/").unwrap();
    let cart = open(storage.clone(), location.clone(), "main");

    cart.add_item(gaming());
    assert_eq!(cart.switch_tenant("runa"), LoadOrigin::FreshEmpty);
    assert!(cart.state().is_empty());

    cart.add_item(coffee());
    cart.add_item(coffee());

    assert_eq!(stored_items(&storage, "main"), vec![CartItem::new(gaming(), 1, test_time())]);
    assert_eq!(stored_items(&storage, "runa"), vec![CartItem::new(coffee(), 2, test_time())]);
    assert!(location.query_param("cart").is_some());
    assert!(location.query_param("cart_runa").is_some());

    cart.switch_tenant("main");
    assert_eq!(cart.state().items, vec![CartItem::new(gaming(), 1, test_time())]);
}

#[test]
fn switching_to_live_tenant_keeps_cart() {
    let cart = open(
        InMemoryStorage::new(),
        InMemoryLocation::parse("https://shop.test/").unwrap(),
        "runa",
    );
    cart.add_item(coffee());

    assert_eq!(cart.switch_tenant(" runa "), LoadOrigin::FreshEmpty);
    assert_eq!(cart.count(), 1);
}

#[test]
fn restore_from_url_adopts_navigated_link() {
    let storage = InMemoryStorage::new();
    let location = InMemoryLocation::parse("https://shop.test/").unwrap();
    let cart = open(storage.clone(), location.clone(), "main");
    cart.add_item(gaming());

    let token = codec::encode(&[CartItem::new(coffee(), 2, test_time())]);
    location.navigate(Url::parse(&format!("https://shop.test/?cart={token}")).unwrap());

    assert!(cart.restore_from_url());
    assert_eq!(cart.load_origin(), LoadOrigin::FromSharedLink);
    assert_eq!(cart.state().items, vec![CartItem::new(coffee(), 2, test_time())]);
    assert_eq!(stored_items(&storage, "main"), cart.state().items);
}

// ============================================================================
// Failing hosts
// ============================================================================

#[test]
fn full_storage_never_breaks_mutations() {
    let storage = FailingStorage::quota_exceeded();
    let location = InMemoryLocation::parse("https://shop.test/").unwrap();
    let cart = open(storage.clone(), location.clone(), "main");

    cart.add_item(gaming());
    cart.update_quantity("gaming-package", 5);
    cart.remove_item("gaming-package");
    cart.add_item(coffee());
    cart.clear();

    assert!(cart.state().is_empty());
    assert!(storage.attempts() >= 5);
}

#[test]
fn unreadable_storage_opens_from_url() {
    let token = codec::encode(&[CartItem::new(coffee(), 1, test_time())]);
    let location = InMemoryLocation::parse(&format!("https://shop.test/?cart={token}")).unwrap();

    let cart = open(
        FailingStorage::new(StorageError::Unavailable("private mode".to_string())),
        location,
        "main",
    );

    assert_eq!(cart.load_origin(), LoadOrigin::FromSharedLink);
    assert_eq!(cart.count(), 1);
}

#[test]
fn cart_works_without_a_location() {
    let storage = InMemoryStorage::new();
    let location = FailingLocation::unavailable();
    let cart = open(storage.clone(), location.clone(), "main");

    cart.add_item(gaming());

    assert_eq!(cart.count(), 1);
    assert_eq!(stored_items(&storage, "main").len(), 1);
    assert_eq!(location.replace_attempts(), 0);
}

#[test]
fn read_only_history_keeps_durable_copy() {
    let storage = InMemoryStorage::new();
    let location = FailingLocation::read_only(Url::parse("https://shop.test/").unwrap());
    let cart = open(storage.clone(), location.clone(), "main");

    cart.add_item(gaming());

    assert_eq!(stored_items(&storage, "main").len(), 1);
    assert_eq!(location.replace_attempts(), 1);
}

#[test]
fn file_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");

    let first = open(
        FileStorage::new(&path),
        InMemoryLocation::parse("https://shop.test/").unwrap(),
        "main",
    );
    first.add_item(gaming());
    first.add_item(gaming());

    let second = open(
        FileStorage::new(&path),
        InMemoryLocation::parse("https://shop.test/").unwrap(),
        "main",
    );

    assert_eq!(second.load_origin(), LoadOrigin::FromDurable);
    assert_eq!(second.count(), 2);
}

#[test]
fn corrupt_storage_file_recovers_on_next_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");
    std::fs::write(&path, "{truncated").unwrap();

    let first = open(
        FileStorage::new(&path),
        InMemoryLocation::parse("https://shop.test/").unwrap(),
        "main",
    );
    assert_eq!(first.load_origin(), LoadOrigin::FreshEmpty);
    first.add_item(gaming());
    first.add_item(gaming());

    let second = open(
        FileStorage::new(&path),
        InMemoryLocation::parse("https://shop.test/").unwrap(),
        "main",
    );

    assert_eq!(second.load_origin(), LoadOrigin::FromDurable);
    assert_eq!(second.count(), 2);
    assert!(dir.path().join("cart.json.corrupt").exists());
}
