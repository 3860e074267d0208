mod common;

use assert_matches::assert_matches;
use bloomtrack::entities::product::{ProductCategory, VariantType};
use bloomtrack::errors::ServiceError;
use bloomtrack::services::catalog::{CreateProductInput, RecipeLineInput};
use bloomtrack::services::requirements::Substitution;
use common::TestApp;
use rust_decimal_macros::dec;

async fn mixed_recipe_product(app: &TestApp, greens_id: i64) -> i64 {
    app.state
        .catalog
        .create_product(CreateProductInput {
            name: "Designer's Choice".to_string(),
            selling_price: dec!(85.00),
            image: None,
            note: None,
            recipe: vec![
                RecipeLineInput::Specific {
                    item_id: greens_id,
                    qty: 3,
                    note: None,
                },
                RecipeLineInput::Category {
                    label: "Rose".to_string(),
                    qty: 10,
                    note: Some("any color in season".to_string()),
                },
                RecipeLineInput::Category {
                    label: "Filler".to_string(),
                    qty: 5,
                    note: None,
                },
            ],
            category: ProductCategory::Standard,
            variant_group_id: None,
            variant_type: VariantType::Std,
            initial_goal: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn recipe_requirements_split_into_specific_and_generic() {
    let app = TestApp::new().await;
    let greens = app.seed_item("Eucalyptus", Some("Greenery"), 50).await;
    let product = mixed_recipe_product(&app, greens).await;

    let reqs = app
        .state
        .requirements
        .get_recipe_requirements(product)
        .await
        .unwrap();

    assert!(reqs.has_generics);
    assert_eq!(reqs.specific_items.len(), 1);
    assert_eq!(reqs.specific_items[0].item_id, greens);
    assert_eq!(reqs.specific_items[0].qty, 3);
    assert_eq!(reqs.generic_items.len(), 2);
    assert_eq!(reqs.generic_items[0].category, "Rose");
    assert_eq!(reqs.generic_items[0].qty, 10);
    assert_eq!(
        reqs.generic_items[0].note.as_deref(),
        Some("any color in season")
    );
}

#[tokio::test]
async fn all_specific_recipe_has_no_generics() {
    let app = TestApp::new().await;
    let rose = app.seed_item("Red Rose", Some("Rose"), 50).await;
    let product = app.seed_product("Classic Dozen", rose, 12).await;

    let reqs = app
        .state
        .requirements
        .get_recipe_requirements(product)
        .await
        .unwrap();

    assert!(!reqs.has_generics);
    assert!(reqs.generic_items.is_empty());
}

#[tokio::test]
async fn requirements_for_unknown_product_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .requirements
        .get_recipe_requirements(31337)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn items_for_category_lists_candidates() {
    let app = TestApp::new().await;
    app.seed_item("White Rose", Some("Rose"), 10).await;
    app.seed_item("Red Rose", Some("Rose"), 10).await;
    app.seed_item("Baby's Breath", Some("Filler"), 10).await;

    let candidates = app
        .state
        .requirements
        .items_for_category("Rose")
        .await
        .unwrap();
    assert_eq!(candidates.len(), 2);
}

#[tokio::test]
async fn allocation_must_match_every_category_exactly() {
    let app = TestApp::new().await;
    let greens = app.seed_item("Eucalyptus", Some("Greenery"), 50).await;
    let red = app.seed_item("Red Rose", Some("Rose"), 50).await;
    let white = app.seed_item("White Rose", Some("Rose"), 50).await;
    let filler = app.seed_item("Baby's Breath", Some("Filler"), 50).await;
    let product = mixed_recipe_product(&app, greens).await;

    let reqs = app
        .state
        .requirements
        .get_recipe_requirements(product)
        .await
        .unwrap();

    // Split across two roses plus the filler line.
    app.state
        .requirements
        .validate_allocation(
            &reqs.generic_items,
            &[
                Substitution {
                    item_id: red,
                    qty: 6,
                },
                Substitution {
                    item_id: white,
                    qty: 4,
                },
                Substitution {
                    item_id: filler,
                    qty: 5,
                },
            ],
        )
        .await
        .unwrap();

    // A missing filler allocation fails even though the roses add up.
    let err = app
        .state
        .requirements
        .validate_allocation(
            &reqs.generic_items,
            &[Substitution {
                item_id: red,
                qty: 10,
            }],
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn allocation_rejects_items_outside_the_required_categories() {
    let app = TestApp::new().await;
    let greens = app.seed_item("Eucalyptus", Some("Greenery"), 50).await;
    let red = app.seed_item("Red Rose", Some("Rose"), 50).await;
    let filler = app.seed_item("Baby's Breath", Some("Filler"), 50).await;
    let tulip = app.seed_item("Tulip", Some("Tulip"), 50).await;
    let product = mixed_recipe_product(&app, greens).await;

    let reqs = app
        .state
        .requirements
        .get_recipe_requirements(product)
        .await
        .unwrap();

    let err = app
        .state
        .requirements
        .validate_allocation(
            &reqs.generic_items,
            &[
                Substitution {
                    item_id: red,
                    qty: 10,
                },
                Substitution {
                    item_id: filler,
                    qty: 5,
                },
                Substitution {
                    item_id: tulip,
                    qty: 1,
                },
            ],
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn allocation_with_unknown_item_is_not_found() {
    let app = TestApp::new().await;
    let greens = app.seed_item("Eucalyptus", Some("Greenery"), 50).await;
    let product = mixed_recipe_product(&app, greens).await;

    let reqs = app
        .state
        .requirements
        .get_recipe_requirements(product)
        .await
        .unwrap();

    let err = app
        .state
        .requirements
        .validate_allocation(
            &reqs.generic_items,
            &[Substitution {
                item_id: 424242,
                qty: 10,
            }],
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}
