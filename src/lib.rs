//! Bloomtrack Core Library
//!
//! Embedded transactional core for a made-to-order floral operation:
//! a raw-material inventory ledger, a versioned product catalog with
//! immutable recipes, a due-dated production goal engine with two
//! production paths (MAKE from raw materials, PACK from cooler stock),
//! and an append-only production log that gives every action exactly one
//! LIFO undo.
//!
//! There is no network surface. Embedders construct an [`AppState`] over a
//! database pool and call the services directly.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod queries;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub inventory: services::InventoryService,
    pub catalog: services::CatalogService,
    pub production: services::ProductionService,
    pub requirements: services::RequirementsService,
}

impl AppState {
    /// Wires every service over one shared pool and event channel.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let event_sender = Arc::new(event_sender);
        Self {
            inventory: services::InventoryService::new(db.clone(), event_sender.clone()),
            catalog: services::CatalogService::new(db.clone(), event_sender.clone()),
            production: services::ProductionService::new(db.clone(), event_sender.clone()),
            requirements: services::RequirementsService::new(db.clone()),
            db,
            config,
            event_sender,
        }
    }
}
