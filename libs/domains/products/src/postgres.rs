use async_trait::async_trait;
use database::BaseRepository;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{ProductError, ProductResult},
    models::{CreateProduct, Product, ProductFilter, UpdateProduct},
    query,
    repository::{InventoryStore, InventoryUow, ProductRepository},
};

#[derive(Clone)]
pub struct PgProductRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let exists = self.exists_by_sku(&input.sku).await?;
        if exists {
            return Err(ProductError::DuplicateSku(input.sku));
        }

        let active_model: entity::ActiveModel = input.into();
        let model = self.base.insert(active_model).await?;

        tracing::info!(product_id = %model.id, "Created product");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let model = self.base.find_by_id(id).await?;
        Ok(model.map(|m| m.into()))
    }

    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let models = query::compile(&filter)
            .into_select()
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn browse(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let models = query::compile_catalog(&filter)
            .into_select()
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        let model = self
            .base
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(vec![id]))?;

        if let Some(ref new_sku) = input.sku {
            let sku_taken = entity::Entity::find()
                .filter(entity::Column::Sku.eq(new_sku))
                .filter(entity::Column::Id.ne(id))
                .one(self.base.db())
                .await?
                .is_some();

            if sku_taken {
                return Err(ProductError::DuplicateSku(new_sku.clone()));
            }
        }

        let mut product: Product = model.into();
        product.apply_update(input);

        let active_model: entity::ActiveModel = product.into();
        let updated_model = self.base.update(active_model).await?;

        tracing::info!(product_id = %id, "Updated product");
        Ok(updated_model.into())
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let rows_affected = self.base.delete_by_id(id).await?;

        if rows_affected > 0 {
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn exists_by_sku(&self, sku: &str) -> ProductResult<bool> {
        let exists = entity::Entity::find()
            .filter(entity::Column::Sku.eq(sku))
            .one(self.base.db())
            .await?
            .is_some();

        Ok(exists)
    }
}

/// Postgres unit of work backed by a database transaction
///
/// The transaction is held until `commit` or `rollback` takes it; dropping
/// the handle without finishing rolls the transaction back.
pub struct PgInventoryUow {
    tx: Option<DatabaseTransaction>,
}

impl PgInventoryUow {
    fn tx(&self) -> ProductResult<&DatabaseTransaction> {
        self.tx
            .as_ref()
            .ok_or_else(|| ProductError::Database("transaction already finished".to_string()))
    }
}

#[async_trait]
impl InventoryStore for PgProductRepository {
    type Uow = PgInventoryUow;

    async fn begin(&self) -> ProductResult<Self::Uow> {
        let tx = self.base.db().begin().await?;
        Ok(PgInventoryUow { tx: Some(tx) })
    }
}

#[async_trait]
impl InventoryUow for PgInventoryUow {
    async fn products_for_update(&mut self, ids: &[Uuid]) -> ProductResult<Vec<Product>> {
        let models = entity::Entity::find()
            .filter(entity::Column::Id.is_in(ids.to_vec()))
            .lock_exclusive()
            .all(self.tx()?)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn decrement_stock(&mut self, id: Uuid, quantity: i64) -> ProductResult<u64> {
        let result = entity::Entity::update_many()
            .col_expr(
                entity::Column::Stock,
                Expr::col(entity::Column::Stock).sub(quantity),
            )
            .filter(entity::Column::Id.eq(id))
            .exec(self.tx()?)
            .await?;

        Ok(result.rows_affected)
    }

    async fn commit(&mut self) -> ProductResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| ProductError::Database("transaction already finished".to_string()))?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> ProductResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| ProductError::Database("transaction already finished".to_string()))?;
        tx.rollback().await?;
        Ok(())
    }
}
