mod common;

use assert_matches::assert_matches;
use bloomtrack::errors::ServiceError;
use bloomtrack::services::inventory::CreateItemInput;
use common::TestApp;
use rust_decimal_macros::dec;

#[tokio::test]
async fn create_item_stores_all_fields() {
    let app = TestApp::new().await;

    let id = app
        .state
        .inventory
        .create_item(CreateItemInput {
            name: "Red Rose".to_string(),
            category: Some("Rose".to_string()),
            sub_category: Some("Focal".to_string()),
            count_on_hand: 100,
            unit_cost: dec!(0.85),
            bundle_count: 25,
        })
        .await
        .unwrap();

    let item = app.state.inventory.get_item(id).await.unwrap().unwrap();
    assert_eq!(item.name, "Red Rose");
    assert_eq!(item.category.as_deref(), Some("Rose"));
    assert_eq!(item.sub_category.as_deref(), Some("Focal"));
    assert_eq!(item.count_on_hand, 100);
    assert_eq!(item.unit_cost, dec!(0.85));
    assert_eq!(item.bundle_count, 25);
}

#[tokio::test]
async fn adjust_count_is_relative_and_may_go_negative() {
    let app = TestApp::new().await;
    let id = app.seed_item("Eucalyptus", Some("Greenery"), 10).await;

    app.state.inventory.adjust_count(id, -4).await.unwrap();
    assert_eq!(app.item_count(id).await, 6);

    app.state.inventory.adjust_count(id, 20).await.unwrap();
    assert_eq!(app.item_count(id).await, 26);

    // No floor at the ledger layer.
    app.state.inventory.adjust_count(id, -30).await.unwrap();
    assert_eq!(app.item_count(id).await, -4);
}

#[tokio::test]
async fn adjust_count_on_unknown_item_is_not_found() {
    let app = TestApp::new().await;

    let err = app.state.inventory.adjust_count(9999, 1).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn set_operations_overwrite_in_place() {
    let app = TestApp::new().await;
    let id = app.seed_item("Lily", Some("Lily"), 5).await;

    app.state.inventory.set_count(id, 40).await.unwrap();
    app.state.inventory.set_cost(id, dec!(2.25)).await.unwrap();
    app.state.inventory.set_bundle(id, 10).await.unwrap();

    let item = app.state.inventory.get_item(id).await.unwrap().unwrap();
    assert_eq!(item.count_on_hand, 40);
    assert_eq!(item.unit_cost, dec!(2.25));
    assert_eq!(item.bundle_count, 10);
}

#[tokio::test]
async fn bundle_count_below_one_is_rejected() {
    let app = TestApp::new().await;
    let id = app.seed_item("Ribbon", None, 5).await;

    let err = app.state.inventory.set_bundle(id, 0).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let item = app.state.inventory.get_item(id).await.unwrap().unwrap();
    assert_eq!(item.bundle_count, 1);
}

#[tokio::test]
async fn items_by_category_filters_and_sorts() {
    let app = TestApp::new().await;
    app.seed_item("White Rose", Some("Rose"), 10).await;
    app.seed_item("Red Rose", Some("Rose"), 10).await;
    app.seed_item("Tulip", Some("Tulip"), 10).await;

    let roses = app
        .state
        .inventory
        .items_by_category("Rose")
        .await
        .unwrap();
    let names: Vec<&str> = roses.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Red Rose", "White Rose"]);
}

#[tokio::test]
async fn list_items_returns_everything_sorted_by_name() {
    let app = TestApp::new().await;
    app.seed_item("Zinnia", None, 1).await;
    app.seed_item("Aster", None, 1).await;

    let items = app.state.inventory.list_items().await.unwrap();
    let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Aster", "Zinnia"]);
}
