use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use crate::models::{CreateProduct, Product, ProductCategory};

/// SeaORM entity for the `products` table
///
/// `category` is stored as text; the closed-set guarantee lives in the domain
/// layer (enum parsing on the way in, [`ProductCategory`] on the way out).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub image_urls: Json,
    #[sea_orm(column_type = "Text")]
    pub notes: String,
    pub price: i64,
    pub stock: i32,
    pub location: String,
    pub is_available: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl database::UuidEntity for Entity {}

// Conversion from SeaORM Model to domain Product
impl From<Model> for Product {
    fn from(model: Model) -> Self {
        let image_urls: Vec<String> =
            serde_json::from_value(model.image_urls.clone()).unwrap_or_default();

        Self {
            id: model.id,
            created_at: model.created_at.into(),
            name: model.name,
            sku: model.sku,
            category: model
                .category
                .parse::<ProductCategory>()
                .unwrap_or_default(),
            image_urls,
            notes: model.notes,
            price: model.price,
            stock: model.stock,
            location: model.location,
            is_available: model.is_available,
        }
    }
}

// Conversion from domain CreateProduct to SeaORM ActiveModel
impl From<CreateProduct> for ActiveModel {
    fn from(input: CreateProduct) -> Self {
        Product::new(input).into()
    }
}

// Conversion from domain Product to SeaORM ActiveModel (full row)
impl From<Product> for ActiveModel {
    fn from(product: Product) -> Self {
        let image_urls =
            serde_json::to_value(&product.image_urls).expect("Failed to serialize image urls");

        ActiveModel {
            id: Set(product.id),
            created_at: Set(product.created_at.into()),
            name: Set(product.name),
            sku: Set(product.sku),
            category: Set(product.category.to_string()),
            image_urls: Set(image_urls),
            notes: Set(product.notes),
            price: Set(product.price),
            stock: Set(product.stock),
            location: Set(product.location),
            is_available: Set(product.is_available),
        }
    }
}
