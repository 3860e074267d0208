pub mod inventory_item;
pub mod product;
pub mod production_goal;
pub mod production_log;
pub mod recipe_line;

pub use inventory_item::Entity as InventoryItem;
pub use product::Entity as Product;
pub use production_goal::Entity as ProductionGoal;
pub use production_log::Entity as ProductionLog;
pub use recipe_line::Entity as RecipeLine;
