mod common;

use bloomtrack::entities::production_log::ActionType;
use bloomtrack::queries;
use chrono::{Duration, Utc};
use common::{date, TestApp};

#[tokio::test]
async fn weekly_summary_buckets_goals_by_monday() {
    let app = TestApp::new().await;
    let rose = app.seed_item("Red Rose", Some("Rose"), 100).await;
    let product = app.seed_product("Classic Dozen", rose, 12).await;

    // Monday and Wednesday of the same week, then the following Monday.
    app.state
        .production
        .schedule_goal(product, date(2024, 3, 4), 3)
        .await
        .unwrap();
    app.state
        .production
        .schedule_goal(product, date(2024, 3, 6), 2)
        .await
        .unwrap();
    app.state
        .production
        .schedule_goal(product, date(2024, 3, 11), 7)
        .await
        .unwrap();

    let summary = queries::weekly_goal_summary(app.state.db.as_ref())
        .await
        .unwrap();

    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0].week_start, date(2024, 3, 4));
    assert_eq!(summary[0].qty_ordered, 5);
    assert_eq!(summary[1].week_start, date(2024, 3, 11));
    assert_eq!(summary[1].qty_ordered, 7);
}

#[tokio::test]
async fn production_requirements_cover_active_and_archived_with_need() {
    let app = TestApp::new().await;
    let rose = app.seed_item("Red Rose", Some("Rose"), 100).await;
    let quiet = app.seed_product("Quiet Seller", rose, 6).await;
    let busy = app.seed_product("Busy Seller", rose, 6).await;
    let retired = app.seed_product("Retired Special", rose, 6).await;

    app.state
        .production
        .schedule_goal(busy, date(2024, 3, 5), 8)
        .await
        .unwrap();
    app.state
        .production
        .schedule_goal(retired, date(2024, 3, 6), 2)
        .await
        .unwrap();
    app.state.catalog.archive_product(retired).await.unwrap();
    app.set_stock(busy, 3).await;

    let rows = queries::production_requirements(
        app.state.db.as_ref(),
        date(2024, 3, 4),
        date(2024, 3, 10),
    )
    .await
    .unwrap();

    assert_eq!(rows.len(), 3);

    let quiet_row = rows.iter().find(|r| r.product_id == quiet).unwrap();
    assert!(quiet_row.active);
    assert_eq!(quiet_row.required_qty, 0);

    let busy_row = rows.iter().find(|r| r.product_id == busy).unwrap();
    assert_eq!(busy_row.required_qty, 8);
    assert_eq!(busy_row.stock_on_hand, 3);

    let retired_row = rows.iter().find(|r| r.product_id == retired).unwrap();
    assert!(!retired_row.active);
    assert_eq!(retired_row.required_qty, 2);
}

#[tokio::test]
async fn production_requirements_ignore_goals_outside_the_window() {
    let app = TestApp::new().await;
    let rose = app.seed_item("Red Rose", Some("Rose"), 100).await;
    let product = app.seed_product("Classic Dozen", rose, 12).await;
    app.state
        .production
        .schedule_goal(product, date(2024, 4, 1), 9)
        .await
        .unwrap();

    let rows = queries::production_requirements(
        app.state.db.as_ref(),
        date(2024, 3, 4),
        date(2024, 3, 10),
    )
    .await
    .unwrap();

    let row = rows.iter().find(|r| r.product_id == product).unwrap();
    assert_eq!(row.required_qty, 0);
}

#[tokio::test]
async fn goals_in_range_resolve_products_soonest_first() {
    let app = TestApp::new().await;
    let rose = app.seed_item("Red Rose", Some("Rose"), 100).await;
    let product = app.seed_product("Classic Dozen", rose, 12).await;

    app.state
        .production
        .schedule_goal(product, date(2024, 3, 8), 1)
        .await
        .unwrap();
    app.state
        .production
        .schedule_goal(product, date(2024, 3, 5), 2)
        .await
        .unwrap();
    app.state
        .production
        .schedule_goal(product, date(2024, 4, 1), 3)
        .await
        .unwrap();

    let rows = queries::goals_in_range(
        app.state.db.as_ref(),
        date(2024, 3, 4),
        date(2024, 3, 10),
    )
    .await
    .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].due_date, date(2024, 3, 5));
    assert_eq!(rows[0].product_name, "Classic Dozen");
    assert_eq!(rows[1].due_date, date(2024, 3, 8));
}

#[tokio::test]
async fn material_forecast_nets_against_packs_and_rounds_up() {
    let app = TestApp::new().await;
    let rose = app.seed_item("Red Rose", Some("Rose"), 2).await;
    app.state.inventory.set_bundle(rose, 10).await.unwrap();
    let greens = app.seed_item("Eucalyptus", Some("Greenery"), 100).await;

    let product = app.seed_product("Classic Dozen", rose, 5).await;
    let filler_heavy = app.seed_product("Green Crate", greens, 4).await;

    // 10 units of each product: roses need 50 against 2 packs of 10,
    // greens need 40 against 100 singles.
    let forecast = queries::material_forecast(
        app.state.db.as_ref(),
        &[(product, 10), (filler_heavy, 10)],
    )
    .await
    .unwrap();

    assert_eq!(forecast.len(), 2);

    // Worst shortage sorts first.
    assert_eq!(forecast[0].item_id, rose);
    assert_eq!(forecast[0].total_needed, 50);
    assert_eq!(forecast[0].deficit_units, 30);
    assert_eq!(forecast[0].packs_to_buy, 3);

    assert_eq!(forecast[1].item_id, greens);
    assert_eq!(forecast[1].total_needed, 40);
    assert_eq!(forecast[1].deficit_units, 0);
    assert_eq!(forecast[1].packs_to_buy, 0);
}

#[tokio::test]
async fn material_forecast_skips_empty_and_nonpositive_scenarios() {
    let app = TestApp::new().await;
    let rose = app.seed_item("Red Rose", Some("Rose"), 2).await;
    let product = app.seed_product("Classic Dozen", rose, 5).await;

    let forecast = queries::material_forecast(app.state.db.as_ref(), &[(product, 0)])
        .await
        .unwrap();
    assert!(forecast.is_empty());
}

#[tokio::test]
async fn production_history_lists_newest_first_within_the_window() {
    let app = TestApp::new().await;
    let rose = app.seed_item("Red Rose", Some("Rose"), 100).await;
    let product = app.seed_product("Classic Dozen", rose, 12).await;
    let goal = app.seed_goal(product, 5).await;

    app.state
        .production
        .log_production(goal, &[], false)
        .await
        .unwrap();
    app.state
        .production
        .produce_stock(product, &[], false)
        .await
        .unwrap();

    let now = Utc::now();
    let history = queries::production_history(
        app.state.db.as_ref(),
        now - Duration::hours(1),
        now + Duration::hours(1),
    )
    .await
    .unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, ActionType::Stock);
    assert_eq!(history[0].goal_id, None);
    assert_eq!(history[1].action, ActionType::Make);
    assert_eq!(history[1].goal_id, Some(goal));
    assert!(history.iter().all(|h| h.product_name == "Classic Dozen"));

    let empty = queries::production_history(
        app.state.db.as_ref(),
        now - Duration::hours(3),
        now - Duration::hours(2),
    )
    .await
    .unwrap();
    assert!(empty.is_empty());
}
