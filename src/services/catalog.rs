use crate::{
    db::DbPool,
    entities::{
        inventory_item::Entity as InventoryItemEntity,
        product::{self, Entity as ProductEntity, ProductCategory, VariantType},
        production_goal::{self, Entity as ProductionGoalEntity},
        recipe_line::{self, Entity as RecipeLineEntity, RequirementKind},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// One line of a recipe as supplied by a caller. A Specific line names a
/// ledger item; a Category line defers the concrete choice to production
/// time.
#[derive(Debug, Clone)]
pub enum RecipeLineInput {
    Specific {
        item_id: i64,
        qty: i32,
        note: Option<String>,
    },
    Category {
        label: String,
        qty: i32,
        note: Option<String>,
    },
}

/// Optional goal scheduled together with a create/revise.
#[derive(Debug, Clone)]
pub struct GoalInput {
    pub due_date: NaiveDate,
    pub qty_ordered: i32,
}

#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub name: String,
    pub selling_price: Decimal,
    pub image: Option<Vec<u8>>,
    pub note: Option<String>,
    pub recipe: Vec<RecipeLineInput>,
    pub category: ProductCategory,
    pub variant_group_id: Option<String>,
    pub variant_type: VariantType,
    pub initial_goal: Option<GoalInput>,
}

/// Omitted fields fall back to the superseded version's values.
#[derive(Debug, Clone)]
pub struct ReviseProductInput {
    pub new_name: String,
    pub recipe: Vec<RecipeLineInput>,
    pub image: Option<Vec<u8>>,
    pub selling_price: Option<Decimal>,
    pub note: Option<String>,
    pub category: Option<ProductCategory>,
    pub variant_type: Option<VariantType>,
    /// Carry `stock_on_hand` forward onto the new version (else it resets
    /// to zero).
    pub rollover_stock: bool,
    /// Re-point still-open goals at the new version so future production
    /// uses the new recipe. Completed goals always stay on the archived id.
    pub migrate_open_goals: bool,
    pub new_goal: Option<GoalInput>,
}

/// The versioned product catalog. Product definitions are immutable per
/// version: every edit archives the current row and inserts a successor, so
/// the log entries written against an old version keep their meaning.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a product version with its recipe, optionally scheduling an
    /// initial goal. If another product is already active under the same
    /// name (case-insensitive) it is archived first, keeping the
    /// single-active-lineage invariant across any create/revise sequence.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: CreateProductInput) -> Result<i64, ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        validate_recipe(&txn, &input.recipe).await?;
        archive_active_by_name(&txn, &input.name, None).await?;

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Default::default(),
            display_name: Set(input.name.clone()),
            image_data: Set(input.image),
            selling_price: Set(input.selling_price),
            active: Set(true),
            stock_on_hand: Set(0),
            category: Set(input.category),
            note: Set(input.note),
            variant_group_id: Set(input.variant_group_id),
            variant_type: Set(input.variant_type),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&txn).await?;

        insert_recipe(&txn, created.id, &input.recipe).await?;

        if let Some(goal) = input.initial_goal {
            insert_goal(&txn, created.id, &goal).await?;
        }

        txn.commit().await?;

        info!(product_id = created.id, "product created");
        self.event_sender
            .send_or_log(Event::ProductCreated {
                product_id: created.id,
            })
            .await;

        Ok(created.id)
    }

    /// Supersedes a product version: archive the current row, insert the
    /// successor carrying forward whatever the input leaves unset, re-point
    /// open goals when asked. One transaction; a partial archive without a
    /// successor is never observable.
    #[instrument(skip(self, input), fields(new_name = %input.new_name))]
    pub async fn revise_product(
        &self,
        product_id: i64,
        input: ReviseProductInput,
    ) -> Result<i64, ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        let current = ProductEntity::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {} not found", product_id)))?;

        validate_recipe(&txn, &input.recipe).await?;

        // Renaming onto another active product archives the collision
        // target first.
        archive_active_by_name(&txn, &input.new_name, Some(product_id)).await?;

        let mut archived = current.clone().into_active_model();
        archived.active = Set(false);
        archived.updated_at = Set(Utc::now());
        archived.update(&txn).await?;

        let now = Utc::now();
        let successor = product::ActiveModel {
            id: Default::default(),
            display_name: Set(input.new_name.clone()),
            image_data: Set(input.image.or(current.image_data)),
            selling_price: Set(input.selling_price.unwrap_or(current.selling_price)),
            active: Set(true),
            stock_on_hand: Set(if input.rollover_stock {
                current.stock_on_hand
            } else {
                0
            }),
            category: Set(input.category.unwrap_or(current.category)),
            note: Set(input.note.or(current.note)),
            variant_group_id: Set(current.variant_group_id),
            variant_type: Set(input.variant_type.unwrap_or(current.variant_type)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = successor.insert(&txn).await?;

        insert_recipe(&txn, created.id, &input.recipe).await?;

        if input.migrate_open_goals {
            let open_goals = ProductionGoalEntity::find()
                .filter(production_goal::Column::ProductId.eq(product_id))
                .all(&txn)
                .await?;
            for goal in open_goals.into_iter().filter(|g| g.is_open()) {
                let mut active = goal.into_active_model();
                active.product_id = Set(created.id);
                active.update(&txn).await?;
            }
        }

        if let Some(goal) = input.new_goal {
            insert_goal(&txn, created.id, &goal).await?;
        }

        txn.commit().await?;

        info!(old_id = product_id, new_id = created.id, "product revised");
        self.event_sender
            .send_or_log(Event::ProductRevised {
                old_id: product_id,
                new_id: created.id,
            })
            .await;

        Ok(created.id)
    }

    /// Retires a version from the active catalog. Recipe lines, goals and
    /// log entries stay put so history and undo keep working.
    #[instrument(skip(self))]
    pub async fn archive_product(&self, product_id: i64) -> Result<(), ServiceError> {
        let db = self.connection();
        let current = ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {} not found", product_id)))?;

        let mut active = current.into_active_model();
        active.active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;

        self.event_sender
            .send_or_log(Event::ProductArchived { product_id })
            .await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        product_id: i64,
    ) -> Result<Option<product::Model>, ServiceError> {
        Ok(ProductEntity::find_by_id(product_id)
            .one(self.connection())
            .await?)
    }

    /// Case-insensitive lookup among active versions.
    #[instrument(skip(self))]
    pub async fn find_active_by_name(
        &self,
        name: &str,
    ) -> Result<Option<product::Model>, ServiceError> {
        Ok(ProductEntity::find()
            .filter(product::Column::Active.eq(true))
            .filter(name_matches(name))
            .one(self.connection())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn product_exists(&self, name: &str) -> Result<bool, ServiceError> {
        Ok(self.find_active_by_name(name).await?.is_some())
    }

    #[instrument(skip(self))]
    pub async fn list_active_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(ProductEntity::find()
            .filter(product::Column::Active.eq(true))
            .order_by_asc(product::Column::DisplayName)
            .all(self.connection())
            .await?)
    }

    /// The immutable recipe of one product version.
    #[instrument(skip(self))]
    pub async fn recipe_for(
        &self,
        product_id: i64,
    ) -> Result<Vec<recipe_line::Model>, ServiceError> {
        Ok(RecipeLineEntity::find()
            .filter(recipe_line::Column::ProductId.eq(product_id))
            .order_by_asc(recipe_line::Column::Id)
            .all(self.connection())
            .await?)
    }

    /// Active siblings of a variant family (STD/DLX/PRM of one base name).
    #[instrument(skip(self))]
    pub async fn variants_of(
        &self,
        variant_group_id: &str,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Ok(ProductEntity::find()
            .filter(product::Column::Active.eq(true))
            .filter(product::Column::VariantGroupId.eq(variant_group_id))
            .order_by_asc(product::Column::VariantType)
            .all(self.connection())
            .await?)
    }

    fn connection(&self) -> &DbPool {
        self.db_pool.as_ref()
    }
}

/// Fresh identifier for a new variant family. Siblings created afterwards
/// share it via `CreateProductInput::variant_group_id`.
pub fn new_variant_group_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn name_matches(name: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(product::Column::DisplayName))).eq(name.to_lowercase())
}

/// Rejects recipes whose Specific lines reference missing ledger items, and
/// nonsensical quantities. Runs inside the caller's transaction so a
/// rejection rolls the whole operation back.
async fn validate_recipe<C: ConnectionTrait>(
    conn: &C,
    recipe: &[RecipeLineInput],
) -> Result<(), ServiceError> {
    for line in recipe {
        match line {
            RecipeLineInput::Specific { item_id, qty, .. } => {
                if *qty <= 0 {
                    return Err(ServiceError::ValidationError(
                        "recipe quantities must be positive".into(),
                    ));
                }
                let exists = InventoryItemEntity::find_by_id(*item_id).one(conn).await?;
                if exists.is_none() {
                    return Err(ServiceError::InvalidRecipeReference(format!(
                        "inventory item {} does not exist",
                        item_id
                    )));
                }
            }
            RecipeLineInput::Category { label, qty, .. } => {
                if *qty <= 0 {
                    return Err(ServiceError::ValidationError(
                        "recipe quantities must be positive".into(),
                    ));
                }
                if label.trim().is_empty() {
                    return Err(ServiceError::ValidationError(
                        "category requirement needs a label".into(),
                    ));
                }
            }
        }
    }
    Ok(())
}

async fn insert_recipe<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
    recipe: &[RecipeLineInput],
) -> Result<(), ServiceError> {
    for line in recipe {
        let model = match line {
            RecipeLineInput::Specific { item_id, qty, note } => recipe_line::ActiveModel {
                id: Default::default(),
                product_id: Set(product_id),
                kind: Set(RequirementKind::Specific),
                item_id: Set(Some(*item_id)),
                category_label: Set(None),
                qty_needed: Set(*qty),
                note: Set(note.clone()),
            },
            RecipeLineInput::Category { label, qty, note } => recipe_line::ActiveModel {
                id: Default::default(),
                product_id: Set(product_id),
                kind: Set(RequirementKind::Category),
                item_id: Set(None),
                category_label: Set(Some(label.clone())),
                qty_needed: Set(*qty),
                note: Set(note.clone()),
            },
        };
        model.insert(conn).await?;
    }
    Ok(())
}

pub(crate) async fn insert_goal<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
    goal: &GoalInput,
) -> Result<i64, ServiceError> {
    if goal.qty_ordered <= 0 {
        return Err(ServiceError::ValidationError(
            "goal quantity must be positive".into(),
        ));
    }
    let model = production_goal::ActiveModel {
        id: Default::default(),
        product_id: Set(product_id),
        due_date: Set(goal.due_date),
        qty_ordered: Set(goal.qty_ordered),
        qty_fulfilled: Set(0),
        created_at: Set(Utc::now()),
    };
    let created = model.insert(conn).await?;
    Ok(created.id)
}

/// Archives whichever product is active under `name`, excluding
/// `keep_product_id` (the row a revise is about to archive itself).
async fn archive_active_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    keep_product_id: Option<i64>,
) -> Result<(), ServiceError> {
    let mut query = ProductEntity::find()
        .filter(product::Column::Active.eq(true))
        .filter(name_matches(name));
    if let Some(id) = keep_product_id {
        query = query.filter(product::Column::Id.ne(id));
    }

    if let Some(collision) = query.one(conn).await? {
        let mut active = collision.into_active_model();
        active.active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(conn).await?;
    }
    Ok(())
}
