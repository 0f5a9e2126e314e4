use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};

/// Repository trait for Product persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Create a new product
    async fn create(&self, input: CreateProduct) -> ProductResult<Product>;

    /// Get a product by ID
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// List products for the back office with optional filters
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>>;

    /// List products for the customer catalog; only available products
    async fn browse(&self, filter: ProductFilter) -> ProductResult<Vec<Product>>;

    /// Update an existing product
    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product>;

    /// Delete a product by ID
    async fn delete(&self, id: Uuid) -> ProductResult<bool>;

    /// Check if a SKU is already taken
    async fn exists_by_sku(&self, sku: &str) -> ProductResult<bool>;
}

/// Transactional storage port for the inventory engine
///
/// `begin` opens a unit of work; every read and write the engine performs
/// during a checkout goes through the returned handle, and nothing is visible
/// to other callers until `commit`.
#[cfg_attr(test, mockall::automock(type Uow = MockInventoryUow;))]
#[async_trait]
pub trait InventoryStore: Send + Sync {
    type Uow: InventoryUow;

    async fn begin(&self) -> ProductResult<Self::Uow>;
}

/// A single inventory unit of work
///
/// Dropping a handle without calling `commit` must leave stock untouched;
/// `rollback` exists so failures can be surfaced eagerly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryUow: Send {
    /// Fetch the given products, locking each row until the unit of work ends
    async fn products_for_update(&mut self, ids: &[Uuid]) -> ProductResult<Vec<Product>>;

    /// Decrement a product's stock; returns the number of rows touched
    async fn decrement_stock(&mut self, id: Uuid, quantity: i64) -> ProductResult<u64>;

    async fn commit(&mut self) -> ProductResult<()>;

    async fn rollback(&mut self) -> ProductResult<()>;
}

/// In-memory implementation of ProductRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
    // serializes units of work; stands in for row locks
    tx_lock: Arc<tokio::sync::Mutex<()>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            products: Arc::new(RwLock::new(HashMap::new())),
            tx_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn matches(product: &Product, filter: &ProductFilter) -> bool {
        if let Some(name) = filter.name.as_deref() {
            if !name.is_empty()
                && !product.name.to_lowercase().contains(&name.to_lowercase())
            {
                return false;
            }
        }
        if let Some(category) = filter.category.as_deref() {
            // unknown categories are dropped, same as the query compiler
            if let Ok(category) = category.parse() {
                if product.category != category {
                    return false;
                }
            }
        }
        match filter.in_stock {
            Some(true) if product.stock <= 0 => return false,
            Some(false) if product.stock > 0 => return false,
            _ => {}
        }
        true
    }

    fn select(&self, products: Vec<Product>, filter: &ProductFilter) -> Vec<Product> {
        let mut result: Vec<Product> = products
            .into_iter()
            .filter(|p| Self::matches(p, filter))
            .collect();

        match filter.price_sort.as_deref().map(str::parse) {
            Some(Ok(crate::models::PriceSort::Asc)) => result.sort_by_key(|p| p.price),
            Some(Ok(crate::models::PriceSort::Desc)) => {
                result.sort_by_key(|p| std::cmp::Reverse(p.price))
            }
            _ => result.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        result
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let mut products = self.products.write().await;

        let sku_exists = products.values().any(|p| p.sku == input.sku);
        if sku_exists {
            return Err(ProductError::DuplicateSku(input.sku));
        }

        let product = Product::new(input);
        products.insert(product.id, product.clone());

        tracing::info!(product_id = %product.id, "Created product");
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(&id).cloned())
    }

    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(self.select(products.values().cloned().collect(), &filter))
    }

    async fn browse(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;
        let available: Vec<Product> = products
            .values()
            .filter(|p| p.is_available)
            .cloned()
            .collect();
        Ok(self.select(available, &filter))
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        // row rewrites must not interleave with an open unit of work,
        // matching what FOR UPDATE row locks give the Postgres path
        let _tx = self.tx_lock.lock().await;
        let mut products = self.products.write().await;

        if let Some(ref new_sku) = input.sku {
            let sku_exists = products.values().any(|p| p.id != id && &p.sku == new_sku);
            if sku_exists {
                return Err(ProductError::DuplicateSku(new_sku.clone()));
            }
        }

        let product = products
            .get_mut(&id)
            .ok_or_else(|| ProductError::NotFound(vec![id]))?;
        product.apply_update(input);
        let updated = product.clone();

        tracing::info!(product_id = %id, "Updated product");
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let _tx = self.tx_lock.lock().await;
        let mut products = self.products.write().await;

        if products.remove(&id).is_some() {
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn exists_by_sku(&self, sku: &str) -> ProductResult<bool> {
        let products = self.products.read().await;
        Ok(products.values().any(|p| p.sku == sku))
    }
}

/// In-memory unit of work
///
/// Decrements are staged locally and only applied to the shared map on
/// `commit`, which mirrors the visibility rules of a real transaction.
/// Units of work run one at a time: `begin` takes a lock that is released
/// when the handle is dropped, so reads stay consistent with the state the
/// commit will apply to. `update` and `delete` wait on the same lock, so a
/// row rewrite cannot slip between a unit of work's read and its commit.
pub struct InMemoryInventoryUow {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
    staged: Vec<(Uuid, i64)>,
    _guard: tokio::sync::OwnedMutexGuard<()>,
}

#[async_trait]
impl InventoryStore for InMemoryProductRepository {
    type Uow = InMemoryInventoryUow;

    async fn begin(&self) -> ProductResult<Self::Uow> {
        let guard = self.tx_lock.clone().lock_owned().await;
        Ok(InMemoryInventoryUow {
            products: self.products.clone(),
            staged: Vec::new(),
            _guard: guard,
        })
    }
}

#[async_trait]
impl InventoryUow for InMemoryInventoryUow {
    async fn products_for_update(&mut self, ids: &[Uuid]) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn decrement_stock(&mut self, id: Uuid, quantity: i64) -> ProductResult<u64> {
        let products = self.products.read().await;
        if !products.contains_key(&id) {
            return Ok(0);
        }
        drop(products);

        self.staged.push((id, quantity));
        Ok(1)
    }

    async fn commit(&mut self) -> ProductResult<()> {
        let mut products = self.products.write().await;
        for (id, quantity) in self.staged.drain(..) {
            if let Some(product) = products.get_mut(&id) {
                product.stock -= quantity as i32;
            }
        }
        Ok(())
    }

    async fn rollback(&mut self) -> ProductResult<()> {
        self.staged.clear();
        Ok(())
    }
}
