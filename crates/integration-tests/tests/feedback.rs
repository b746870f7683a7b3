//! Change-signal and toast behavior across the wired registry.

use serde_json::json;

use tiffin_client::stores::ToastKind;
use tiffin_client::transport::TransportError;
use tiffin_core::Money;
use tiffin_integration_tests::Harness;

fn line(id: &str) -> tiffin_client::types::CartLine {
    tiffin_client::types::CartLine {
        id: tiffin_core::ProductId::new(id),
        title: id.to_owned(),
        price: Money::from_units(100),
        quantity: 1,
        image: String::new(),
        restaurant_id: None,
    }
}

#[tokio::test]
async fn test_failed_mutation_raises_error_toast() {
    let h = Harness::new();
    h.transport.respond_err(
        "/addresses",
        TransportError::Status {
            status: 400,
            message: "Pincode not serviceable".into(),
        },
    );
    h.stores
        .addresses()
        .add_address(tiffin_client::types::NewAddress {
            label: None,
            street: "12 MG Road".into(),
            city: "Bengaluru".into(),
            postal_code: Some("999999".into()),
            location: None,
        })
        .await;

    let toast = h.stores.notices().current().expect("toast raised");
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.message, "Pincode not serviceable");
}

#[tokio::test]
async fn test_failed_read_stays_in_envelope_not_toast() {
    let h = Harness::new();
    h.transport
        .respond_err("/restaurants", TransportError::Network("offline".into()));
    h.stores.restaurants().fetch_restaurants(None).await;

    // Reads report through their envelope; only mutations toast.
    assert!(h.stores.notices().current().is_none());
    assert!(
        h.stores
            .restaurants()
            .snapshot()
            .restaurants_request
            .error()
            .is_some()
    );
}

#[tokio::test]
async fn test_single_change_channel_covers_all_slices() {
    let h = Harness::new();
    let rx = h.stores.subscribe();

    let t0 = *rx.borrow();
    h.stores.cart().add_or_increment(line("p-1"));
    let t1 = *rx.borrow();
    assert!(t1 > t0);

    h.transport.respond_ok("/restaurants", json!([]));
    h.stores.restaurants().fetch_restaurants(None).await;
    let t2 = *rx.borrow();
    assert!(t2 > t1);

    h.stores.notices().hide();
    let t3 = *rx.borrow();
    assert!(t3 > t2);
}
