//! Transactional inventory engine
//!
//! Validates and commits multi-line checkouts. A checkout either decrements
//! stock for every requested product or leaves every stock level untouched;
//! partial decrements never escape the unit of work. Validation runs in two
//! phases against rows locked for the duration of the transaction, so stock
//! can never go negative even under concurrent checkouts of the same product.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{CheckoutLine, CheckoutReceipt, CheckoutReceiptItem, Product, StockShortfall};
use crate::repository::{InventoryStore, InventoryUow};

pub struct InventoryEngine<S: InventoryStore> {
    store: Arc<S>,
}

impl<S: InventoryStore> InventoryEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Atomically validate and commit a checkout
    ///
    /// Lines naming the same product are aggregated before any check, so a
    /// request is judged against the total it asks for, not per line. Each
    /// distinct product is decremented once.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn checkout(&self, lines: &[CheckoutLine]) -> ProductResult<CheckoutReceipt> {
        let requested = aggregate(lines)?;
        let ids: Vec<Uuid> = requested.iter().map(|(id, _)| *id).collect();

        let mut uow = self.store.begin().await?;

        let products = match uow.products_for_update(&ids).await {
            Ok(products) => products,
            Err(err) => return abort(uow, err).await,
        };
        let by_id: HashMap<Uuid, Product> =
            products.into_iter().map(|p| (p.id, p)).collect();

        if let Err(err) = validate(&requested, &by_id) {
            return abort(uow, err).await;
        }

        for (id, quantity) in &requested {
            match uow.decrement_stock(*id, *quantity).await {
                Ok(1) => {}
                Ok(rows) => {
                    let err = ProductError::Database(format!(
                        "stock decrement for {} touched {} rows",
                        id, rows
                    ));
                    return abort(uow, err).await;
                }
                Err(err) => return abort(uow, err).await,
            }
        }

        uow.commit().await?;

        let items: Vec<CheckoutReceiptItem> = requested
            .iter()
            .map(|(id, quantity)| CheckoutReceiptItem {
                product_id: *id,
                quantity: *quantity,
                unit_price: by_id[id].price,
            })
            .collect();
        let total_price = items.iter().map(|i| i.unit_price * i.quantity).sum();

        tracing::info!(total_price, items = items.len(), "Checkout committed");
        Ok(CheckoutReceipt { items, total_price })
    }
}

/// Sum quantities per product, keeping first-seen order
fn aggregate(lines: &[CheckoutLine]) -> ProductResult<Vec<(Uuid, i64)>> {
    if lines.is_empty() {
        return Err(ProductError::Validation(
            "checkout requires at least one line".to_string(),
        ));
    }

    let mut order: Vec<Uuid> = Vec::new();
    let mut totals: HashMap<Uuid, i64> = HashMap::new();

    for line in lines {
        if line.quantity < 1 {
            return Err(ProductError::Validation(format!(
                "quantity for {} must be at least 1",
                line.product_id
            )));
        }
        if !totals.contains_key(&line.product_id) {
            order.push(line.product_id);
        }
        *totals.entry(line.product_id).or_insert(0) += line.quantity as i64;
    }

    Ok(order.into_iter().map(|id| (id, totals[&id])).collect())
}

/// Two-phase check: existence and availability first, then stock sufficiency.
/// Each phase reports every offender, not just the first.
fn validate(
    requested: &[(Uuid, i64)],
    by_id: &HashMap<Uuid, Product>,
) -> ProductResult<()> {
    let missing: Vec<Uuid> = requested
        .iter()
        .filter(|(id, _)| !by_id.contains_key(id))
        .map(|(id, _)| *id)
        .collect();
    if !missing.is_empty() {
        return Err(ProductError::NotFound(missing));
    }

    let unavailable: Vec<Uuid> = requested
        .iter()
        .filter(|(id, _)| !by_id[id].is_available)
        .map(|(id, _)| *id)
        .collect();
    if !unavailable.is_empty() {
        return Err(ProductError::Unavailable(unavailable));
    }

    let shortfalls: Vec<StockShortfall> = requested
        .iter()
        .filter(|(id, quantity)| i64::from(by_id[id].stock) < *quantity)
        .map(|(id, quantity)| StockShortfall {
            product_id: *id,
            requested: *quantity,
            available: i64::from(by_id[id].stock),
        })
        .collect();
    if !shortfalls.is_empty() {
        return Err(ProductError::OutOfStock(shortfalls));
    }

    Ok(())
}

async fn abort<U: InventoryUow, T>(mut uow: U, err: ProductError) -> ProductResult<T> {
    if let Err(rollback_err) = uow.rollback().await {
        tracing::warn!(error = %rollback_err, "Rollback failed after checkout error");
    }
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProduct, ProductCategory};
    use crate::repository::{
        InMemoryProductRepository, MockInventoryStore, MockInventoryUow, ProductRepository,
    };

    fn create_input(sku: &str, price: i64, stock: i32) -> CreateProduct {
        CreateProduct {
            name: format!("Product {}", sku),
            sku: sku.to_string(),
            category: ProductCategory::Beverages,
            image_urls: vec!["https://cdn.example.com/p.jpg".to_string()],
            notes: "Shelf stock".to_string(),
            price,
            stock,
            location: "Aisle 4".to_string(),
            is_available: true,
        }
    }

    fn line(product_id: Uuid, quantity: i32) -> CheckoutLine {
        CheckoutLine {
            product_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_checkout_decrements_every_line() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let p1 = repo.create(create_input("SKU-1", 1000, 10)).await.unwrap();
        let p2 = repo.create(create_input("SKU-2", 2500, 5)).await.unwrap();

        let engine = InventoryEngine::new(repo.clone());
        let receipt = engine
            .checkout(&[line(p1.id, 3), line(p2.id, 5)])
            .await
            .unwrap();

        assert_eq!(receipt.total_price, 3 * 1000 + 5 * 2500);
        assert_eq!(repo.get_by_id(p1.id).await.unwrap().unwrap().stock, 7);
        assert_eq!(repo.get_by_id(p2.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejects_whole_checkout() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let p1 = repo.create(create_input("SKU-1", 1000, 10)).await.unwrap();
        let p2 = repo.create(create_input("SKU-2", 2500, 3)).await.unwrap();

        let engine = InventoryEngine::new(repo.clone());
        let result = engine.checkout(&[line(p1.id, 3), line(p2.id, 5)]).await;

        match result {
            Err(ProductError::OutOfStock(shortfalls)) => {
                assert_eq!(shortfalls.len(), 1);
                assert_eq!(shortfalls[0].product_id, p2.id);
                assert_eq!(shortfalls[0].requested, 5);
                assert_eq!(shortfalls[0].available, 3);
            }
            other => panic!("expected OutOfStock, got {:?}", other.map(|_| ())),
        }

        // no partial decrement
        assert_eq!(repo.get_by_id(p1.id).await.unwrap().unwrap().stock, 10);
        assert_eq!(repo.get_by_id(p2.id).await.unwrap().unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_unknown_product_reports_all_missing_ids() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let p1 = repo.create(create_input("SKU-1", 1000, 10)).await.unwrap();
        let ghost_a = Uuid::now_v7();
        let ghost_b = Uuid::now_v7();

        let engine = InventoryEngine::new(repo.clone());
        let result = engine
            .checkout(&[line(p1.id, 1), line(ghost_a, 1), line(ghost_b, 1)])
            .await;

        match result {
            Err(ProductError::NotFound(missing)) => {
                assert_eq!(missing, vec![ghost_a, ghost_b]);
            }
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
        assert_eq!(repo.get_by_id(p1.id).await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_unavailable_product_rejects_checkout() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let mut input = create_input("SKU-1", 1000, 10);
        input.is_available = false;
        let p1 = repo.create(input).await.unwrap();

        let engine = InventoryEngine::new(repo.clone());
        let result = engine.checkout(&[line(p1.id, 1)]).await;

        assert!(matches!(result, Err(ProductError::Unavailable(ids)) if ids == vec![p1.id]));
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_aggregated() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let p1 = repo.create(create_input("SKU-1", 1000, 5)).await.unwrap();

        let engine = InventoryEngine::new(repo.clone());

        // 3 + 3 = 6 exceeds stock of 5 even though each line alone fits
        let result = engine.checkout(&[line(p1.id, 3), line(p1.id, 3)]).await;
        match result {
            Err(ProductError::OutOfStock(shortfalls)) => {
                assert_eq!(shortfalls[0].requested, 6);
                assert_eq!(shortfalls[0].available, 5);
            }
            other => panic!("expected OutOfStock, got {:?}", other.map(|_| ())),
        }

        // 2 + 3 = 5 fits and commits as one aggregated item
        let receipt = engine
            .checkout(&[line(p1.id, 2), line(p1.id, 3)])
            .await
            .unwrap();
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].quantity, 5);
        assert_eq!(repo.get_by_id(p1.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_empty_checkout_is_rejected_before_any_transaction() {
        let mut store = MockInventoryStore::new();
        store.expect_begin().never();

        let engine = InventoryEngine::new(Arc::new(store));
        let result = engine.checkout(&[]).await;
        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected_before_any_transaction() {
        let mut store = MockInventoryStore::new();
        store.expect_begin().never();

        let engine = InventoryEngine::new(Arc::new(store));
        let result = engine.checkout(&[line(Uuid::now_v7(), 0)]).await;
        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_decrement_failure_rolls_back() {
        let product = Product::new(create_input("SKU-1", 1000, 10));
        let id = product.id;

        let mut store = MockInventoryStore::new();
        store.expect_begin().times(1).returning(move || {
            let product = product.clone();
            let mut uow = MockInventoryUow::new();
            uow.expect_products_for_update()
                .times(1)
                .returning(move |_| Ok(vec![product.clone()]));
            uow.expect_decrement_stock()
                .times(1)
                .returning(|_, _| Err(ProductError::Database("connection reset".to_string())));
            uow.expect_rollback().times(1).returning(|| Ok(()));
            uow.expect_commit().never();
            Ok(uow)
        });

        let engine = InventoryEngine::new(Arc::new(store));
        let result = engine.checkout(&[line(id, 1)]).await;
        assert!(matches!(result, Err(ProductError::Database(_))));
    }

    #[tokio::test]
    async fn test_validation_failure_rolls_back_transaction() {
        let mut store = MockInventoryStore::new();
        store.expect_begin().times(1).returning(|| {
            let mut uow = MockInventoryUow::new();
            uow.expect_products_for_update()
                .times(1)
                .returning(|_| Ok(vec![]));
            uow.expect_rollback().times(1).returning(|| Ok(()));
            uow.expect_decrement_stock().never();
            uow.expect_commit().never();
            Ok(uow)
        });

        let engine = InventoryEngine::new(Arc::new(store));
        let result = engine.checkout(&[line(Uuid::now_v7(), 1)]).await;
        assert!(matches!(result, Err(ProductError::NotFound(_))));
    }
}
