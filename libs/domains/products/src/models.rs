use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Product category
///
/// Closed set: filter values outside it are dropped by the query compiler,
/// and create/update payloads outside it fail deserialization.
/// `Footware` keeps the spelling the stored data uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
pub enum ProductCategory {
    #[default]
    Clothing,
    Accessories,
    Footware,
    Beverages,
}

/// Sort direction for the price order clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PriceSort {
    Asc,
    Desc,
}

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier
    pub id: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Product name
    pub name: String,
    /// Stock Keeping Unit
    pub sku: String,
    /// Product category
    pub category: ProductCategory,
    /// Image URLs
    pub image_urls: Vec<String>,
    /// Free-form notes
    pub notes: String,
    /// Price in the smallest currency unit
    pub price: i64,
    /// Current stock quantity; never negative, enforced by the inventory engine
    pub stock: i32,
    /// Physical location in the store
    pub location: String,
    /// Whether the product can be ordered
    pub is_available: bool,
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 30))]
    pub name: String,
    #[validate(length(min = 1, max = 30))]
    pub sku: String,
    pub category: ProductCategory,
    #[validate(length(min = 1), custom(function = "validate_image_urls"))]
    pub image_urls: Vec<String>,
    #[validate(length(min = 1, max = 200))]
    pub notes: String,
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    pub is_available: bool,
}

/// DTO for updating an existing product
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 30))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 30))]
    pub sku: Option<String>,
    pub category: Option<ProductCategory>,
    #[validate(length(min = 1), custom(function = "validate_image_urls"))]
    pub image_urls: Option<Vec<String>>,
    #[validate(length(min = 1, max = 200))]
    pub notes: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    pub is_available: Option<bool>,
}

/// Query criteria for listing products
///
/// All criteria are optional; only the fields named here are ever translated
/// into a query. `category` and `price_sort` stay stringly-typed on purpose:
/// values outside their closed sets are dropped by the compiler rather than
/// rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring match on the product name
    pub name: Option<String>,
    /// Exact category match; non-category values are ignored
    pub category: Option<String>,
    /// Sort by price: `asc` or `desc`; anything else is ignored
    #[serde(rename = "price")]
    pub price_sort: Option<String>,
    /// `true` → stock > 0, `false` → stock = 0
    #[serde(alias = "inStock")]
    pub in_stock: Option<bool>,
    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Number of results to skip
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    5
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            name: None,
            category: None,
            price_sort: None,
            in_stock: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// One line of a checkout request
///
/// Duplicate product ids across lines are legal; the inventory engine
/// aggregates them before checking stock sufficiency.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// Stock shortfall detail carried by an out-of-stock rejection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockShortfall {
    pub product_id: Uuid,
    /// Requested quantity, aggregated across duplicate lines
    pub requested: i64,
    /// Stock at the time of the check
    pub available: i64,
}

/// Committed checkout summary
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub items: Vec<CheckoutReceiptItem>,
    /// Sum of unit price times quantity across all items
    pub total_price: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceiptItem {
    pub product_id: Uuid,
    /// Committed quantity, aggregated across duplicate lines
    pub quantity: i64,
    pub unit_price: i64,
}

fn validate_image_urls(urls: &Vec<String>) -> Result<(), ValidationError> {
    for url in urls {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ValidationError::new("image_url"));
        }
    }
    Ok(())
}

impl Product {
    /// Create a new product from a CreateProduct DTO
    pub fn new(input: CreateProduct) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: Utc::now(),
            name: input.name,
            sku: input.sku,
            category: input.category,
            image_urls: input.image_urls,
            notes: input.notes,
            price: input.price,
            stock: input.stock,
            location: input.location,
            is_available: input.is_available,
        }
    }

    /// Apply updates from an UpdateProduct DTO
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(sku) = update.sku {
            self.sku = sku;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(image_urls) = update.image_urls {
            self.image_urls = image_urls;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(is_available) = update.is_available {
            self.is_available = is_available;
        }
    }

    /// Check if the product has stock on hand
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreateProduct {
        CreateProduct {
            name: "Canvas Sneaker".to_string(),
            sku: "SNK-001".to_string(),
            category: ProductCategory::Footware,
            image_urls: vec!["https://cdn.example.com/snk-001.jpg".to_string()],
            notes: "Summer collection".to_string(),
            price: 45000,
            stock: 12,
            location: "Aisle 3".to_string(),
            is_available: true,
        }
    }

    #[test]
    fn test_category_round_trip() {
        for category in [
            ProductCategory::Clothing,
            ProductCategory::Accessories,
            ProductCategory::Footware,
            ProductCategory::Beverages,
        ] {
            let parsed: ProductCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("NotARealCategory".parse::<ProductCategory>().is_err());
    }

    #[test]
    fn test_price_sort_parses_lowercase_only() {
        assert_eq!("asc".parse::<PriceSort>().unwrap(), PriceSort::Asc);
        assert_eq!("desc".parse::<PriceSort>().unwrap(), PriceSort::Desc);
        assert!("ASC".parse::<PriceSort>().is_err());
        assert!("cheapest".parse::<PriceSort>().is_err());
    }

    #[test]
    fn test_filter_defaults() {
        let filter = ProductFilter::default();
        assert_eq!(filter.limit, 5);
        assert_eq!(filter.offset, 0);
        assert!(filter.name.is_none());
    }

    #[test]
    fn test_create_product_validation() {
        assert!(valid_create().validate().is_ok());

        let mut input = valid_create();
        input.name = String::new();
        assert!(input.validate().is_err());

        let mut input = valid_create();
        input.price = -1;
        assert!(input.validate().is_err());

        let mut input = valid_create();
        input.image_urls = vec!["not-a-url".to_string()];
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_apply_update_partial() {
        let mut product = Product::new(valid_create());
        let original_sku = product.sku.clone();

        product.apply_update(UpdateProduct {
            price: Some(39000),
            is_available: Some(false),
            ..Default::default()
        });

        assert_eq!(product.price, 39000);
        assert!(!product.is_available);
        assert_eq!(product.sku, original_sku);
    }

    #[test]
    fn test_checkout_line_validation() {
        use validator::Validate;

        let line = CheckoutLine {
            product_id: Uuid::now_v7(),
            quantity: 0,
        };
        assert!(line.validate().is_err());

        let line = CheckoutLine {
            product_id: Uuid::now_v7(),
            quantity: 1,
        };
        assert!(line.validate().is_ok());
    }
}
