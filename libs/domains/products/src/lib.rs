//! Products Domain
//!
//! Store back-office core: product catalog management, a filter-to-query
//! compiler for listings, and a transactional inventory engine for checkouts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐
//! │         Service         │  ← Business logic, validation
//! └─────┬─────────────┬─────┘
//!       │             │
//! ┌─────▼─────┐ ┌─────▼─────┐
//! │ Repository│ │ Inventory │  ← Data access / transactional checkout
//! │  (+query) │ │  Engine   │
//! └─────┬─────┘ └─────┬─────┘
//!       │             │
//! ┌─────▼─────────────▼─────┐
//! │         Models          │  ← Entities, DTOs, enums
//! └─────────────────────────┘
//! ```
//!
//! Listings never interpolate caller input into SQL: the `query` module
//! compiles filter criteria into parameterized statements over a statically
//! enumerated set of fields. Checkouts run inside a single unit of work and
//! either commit every stock decrement or none of them.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{
//!     repository::InMemoryProductRepository,
//!     service::ProductService,
//! };
//!
//! // Create repository and service; the same store backs CRUD and checkout
//! let repository = InMemoryProductRepository::new();
//! let service = ProductService::new(repository.clone(), repository);
//! ```

pub mod checkout;
pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use checkout::InventoryEngine;
pub use error::{ProductError, ProductResult};
pub use models::{
    CheckoutLine, CheckoutReceipt, CheckoutReceiptItem, CreateProduct, PriceSort, Product,
    ProductCategory, ProductFilter, StockShortfall, UpdateProduct,
};
pub use postgres::PgProductRepository;
pub use query::{compile, compile_catalog, CompiledQuery};
pub use repository::{
    InMemoryProductRepository, InventoryStore, InventoryUow, ProductRepository,
};
pub use service::ProductService;
