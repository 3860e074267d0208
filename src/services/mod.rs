// Core services
pub mod catalog;
pub mod inventory;
pub mod production;
pub mod requirements;

pub use catalog::CatalogService;
pub use inventory::InventoryService;
pub use production::ProductionService;
pub use requirements::RequirementsService;
