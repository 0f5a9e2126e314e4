use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::checkout::InventoryEngine;
use crate::error::{ProductError, ProductResult};
use crate::models::{
    CheckoutLine, CheckoutReceipt, CreateProduct, Product, ProductFilter, UpdateProduct,
};
use crate::repository::{InventoryStore, ProductRepository};

/// Service layer for Product business logic
///
/// CRUD and listing go through the repository; checkouts go through the
/// inventory engine, which owns the transaction.
#[derive(Clone)]
pub struct ProductService<R: ProductRepository, S: InventoryStore> {
    repository: Arc<R>,
    engine: Arc<InventoryEngine<S>>,
}

impl<R: ProductRepository, S: InventoryStore> ProductService<R, S> {
    pub fn new(repository: R, store: S) -> Self {
        Self {
            repository: Arc::new(repository),
            engine: Arc::new(InventoryEngine::new(Arc::new(store))),
        }
    }

    /// Create a new product with validation
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.create(input).await
    }

    /// Get a product by ID
    pub async fn get_product(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(vec![id]))
    }

    /// List products for the back office
    pub async fn list_products(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        self.repository.list(filter).await
    }

    /// List products for the customer catalog
    pub async fn browse_products(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        self.repository.browse(filter).await
    }

    /// Update a product
    pub async fn update_product(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.update(id, input).await
    }

    /// Delete a product
    pub async fn delete_product(&self, id: Uuid) -> ProductResult<()> {
        let deleted = self.repository.delete(id).await?;

        if !deleted {
            return Err(ProductError::NotFound(vec![id]));
        }

        Ok(())
    }

    /// Atomically check out a basket of products
    pub async fn checkout(&self, lines: &[CheckoutLine]) -> ProductResult<CheckoutReceipt> {
        self.engine.checkout(lines).await
    }
}
