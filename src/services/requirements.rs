use crate::{
    db::DbPool,
    entities::{
        inventory_item::{self, Entity as InventoryItemEntity},
        product::Entity as ProductEntity,
        recipe_line::{self, Entity as RecipeLineEntity, RequirementKind},
    },
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// A concrete allocation chosen for a category requirement: deduct `qty`
/// units of `item_id`. The production engine applies these verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub item_id: i64,
    pub qty: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificRequirement {
    pub item_id: i64,
    pub qty: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericRequirement {
    pub category: String,
    pub qty: i32,
    pub note: Option<String>,
}

/// What a product version's recipe demands. Callers check `has_generics`
/// before driving the MAKE/STOCK path: a recipe with category lines cannot
/// be produced until a human has picked concrete items for each of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRequirements {
    pub has_generics: bool,
    pub specific_items: Vec<SpecificRequirement>,
    pub generic_items: Vec<GenericRequirement>,
}

/// The generic-requirement resolver. Deliberately free of selection policy:
/// it reports what a recipe needs and checks a caller-collected allocation,
/// but never picks items on its own.
#[derive(Clone)]
pub struct RequirementsService {
    db_pool: Arc<DbPool>,
}

impl RequirementsService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Splits a recipe into its specific and generic halves. This is the
    /// gate callers consult before calling `log_production`/`produce_stock`.
    #[instrument(skip(self))]
    pub async fn get_recipe_requirements(
        &self,
        product_id: i64,
    ) -> Result<RecipeRequirements, ServiceError> {
        let db = self.connection();

        if ProductEntity::find_by_id(product_id).one(db).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "product {} not found",
                product_id
            )));
        }

        let lines = RecipeLineEntity::find()
            .filter(recipe_line::Column::ProductId.eq(product_id))
            .order_by_asc(recipe_line::Column::Id)
            .all(db)
            .await?;

        let mut specific_items = Vec::new();
        let mut generic_items = Vec::new();
        for line in lines {
            match line.kind {
                RequirementKind::Specific => {
                    if let Some(item_id) = line.item_id {
                        specific_items.push(SpecificRequirement {
                            item_id,
                            qty: line.qty_needed,
                        });
                    }
                }
                RequirementKind::Category => {
                    if let Some(category) = line.category_label {
                        generic_items.push(GenericRequirement {
                            category,
                            qty: line.qty_needed,
                            note: line.note,
                        });
                    }
                }
            }
        }

        Ok(RecipeRequirements {
            has_generics: !generic_items.is_empty(),
            specific_items,
            generic_items,
        })
    }

    /// Ledger items available for one category, for the allocation picker.
    #[instrument(skip(self))]
    pub async fn items_for_category(
        &self,
        category: &str,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        Ok(InventoryItemEntity::find()
            .filter(inventory_item::Column::Category.eq(category))
            .order_by_asc(inventory_item::Column::Name)
            .all(self.connection())
            .await?)
    }

    /// Caller-side allocation check: for every generic requirement the
    /// chosen items of that category must sum to the required quantity
    /// exactly, and no substitution may target a category the recipe does
    /// not ask for. The production engine itself trusts whatever list it is
    /// handed; every caller is expected to run this first.
    #[instrument(skip(self, requirements, chosen))]
    pub async fn validate_allocation(
        &self,
        requirements: &[GenericRequirement],
        chosen: &[Substitution],
    ) -> Result<(), ServiceError> {
        let db = self.connection();

        let mut categories: HashMap<i64, Option<String>> = HashMap::new();
        for sub in chosen {
            if sub.qty <= 0 {
                return Err(ServiceError::ValidationError(
                    "allocation quantities must be positive".into(),
                ));
            }
            let item = InventoryItemEntity::find_by_id(sub.item_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("inventory item {} not found", sub.item_id))
                })?;
            categories.insert(sub.item_id, item.category);
        }

        let allocated: Vec<(Option<String>, i32)> = chosen
            .iter()
            .map(|sub| (categories.get(&sub.item_id).cloned().flatten(), sub.qty))
            .collect();

        check_allocation(requirements, &allocated)
    }

    fn connection(&self) -> &DbPool {
        self.db_pool.as_ref()
    }
}

/// Pure allocation check over (item category, qty) pairs.
fn check_allocation(
    requirements: &[GenericRequirement],
    allocated: &[(Option<String>, i32)],
) -> Result<(), ServiceError> {
    let mut per_category: HashMap<&str, i32> = HashMap::new();
    for (category, qty) in allocated {
        let category = category.as_deref().unwrap_or("");
        *per_category.entry(category).or_insert(0) += qty;
    }

    let mut required: HashMap<&str, i32> = HashMap::new();
    for req in requirements {
        *required.entry(req.category.as_str()).or_insert(0) += req.qty;
    }

    for (category, needed) in &required {
        let got = per_category.get(category).copied().unwrap_or(0);
        if got != *needed {
            return Err(ServiceError::ValidationError(format!(
                "category '{}' needs exactly {} units, got {}",
                category, needed, got
            )));
        }
    }

    for (category, qty) in &per_category {
        if *qty > 0 && !required.contains_key(category) {
            return Err(ServiceError::ValidationError(format!(
                "allocation targets category '{}' which the recipe does not require",
                category
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(category: &str, qty: i32) -> GenericRequirement {
        GenericRequirement {
            category: category.to_string(),
            qty,
            note: None,
        }
    }

    #[test]
    fn exact_allocation_passes() {
        let reqs = vec![req("Rose", 12)];
        let allocated = vec![
            (Some("Rose".to_string()), 7),
            (Some("Rose".to_string()), 5),
        ];
        assert!(check_allocation(&reqs, &allocated).is_ok());
    }

    #[test]
    fn under_allocation_is_rejected() {
        let reqs = vec![req("Rose", 12)];
        let allocated = vec![(Some("Rose".to_string()), 11)];
        assert!(check_allocation(&reqs, &allocated).is_err());
    }

    #[test]
    fn over_allocation_is_rejected() {
        let reqs = vec![req("Rose", 12)];
        let allocated = vec![(Some("Rose".to_string()), 13)];
        assert!(check_allocation(&reqs, &allocated).is_err());
    }

    #[test]
    fn foreign_category_is_rejected() {
        let reqs = vec![req("Rose", 2)];
        let allocated = vec![
            (Some("Rose".to_string()), 2),
            (Some("Lily".to_string()), 1),
        ];
        assert!(check_allocation(&reqs, &allocated).is_err());
    }

    #[test]
    fn duplicate_category_lines_accumulate() {
        let reqs = vec![req("Rose", 6), req("Rose", 6)];
        let allocated = vec![(Some("Rose".to_string()), 12)];
        assert!(check_allocation(&reqs, &allocated).is_ok());
    }
}
