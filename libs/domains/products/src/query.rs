//! Filter query compiler
//!
//! Turns a sparse [`ProductFilter`] into a parameterized listing query.
//! The mapping from filter field to predicate is statically enumerated: only
//! the fields handled here ever reach the generated SQL, and column
//! identifiers come from [`entity::Column`], never from caller input. Values
//! that originate from the caller are always carried as bound parameters.
//!
//! Compilation is pure and never fails; values outside a field's closed set
//! (an unknown category, a sort direction that is not `asc`/`desc`) are
//! dropped rather than rejected. Predicates are emitted in a fixed order
//! (name, category, in_stock) so identical criteria always compile to
//! byte-identical SQL.

use sea_orm::sea_query::{Condition, Expr, Order};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select};

use crate::entity;
use crate::models::{PriceSort, ProductCategory, ProductFilter};

/// A compiled, parameterized listing query: predicate set, order clauses,
/// and pagination. Built by [`compile`]/[`compile_catalog`], executed by the
/// repository.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub condition: Condition,
    pub order: Vec<(entity::Column, Order)>,
    pub limit: u64,
    pub offset: u64,
}

impl CompiledQuery {
    /// Attach the compiled pieces to a product select
    pub fn into_select(self) -> Select<entity::Entity> {
        let mut query = entity::Entity::find().filter(self.condition);
        for (column, direction) in self.order {
            query = query.order_by(column, direction);
        }
        query.limit(self.limit).offset(self.offset)
    }
}

/// Compile filter criteria for the back-office listing
pub fn compile(filter: &ProductFilter) -> CompiledQuery {
    compile_with(Condition::all(), filter)
}

/// Compile filter criteria for the customer catalog
///
/// Same translation as [`compile`], anchored on `is_available = true`.
pub fn compile_catalog(filter: &ProductFilter) -> CompiledQuery {
    compile_with(
        Condition::all().add(entity::Column::IsAvailable.eq(true)),
        filter,
    )
}

fn compile_with(mut condition: Condition, filter: &ProductFilter) -> CompiledQuery {
    use sea_orm::sea_query::extension::postgres::PgExpr;

    if let Some(name) = filter.name.as_deref() {
        if !name.is_empty() {
            condition =
                condition.add(Expr::col(entity::Column::Name).ilike(format!("%{}%", name)));
        }
    }

    if let Some(category) = filter.category.as_deref() {
        if let Ok(category) = category.parse::<ProductCategory>() {
            condition = condition.add(entity::Column::Category.eq(category.to_string()));
        }
    }

    match filter.in_stock {
        Some(true) => condition = condition.add(entity::Column::Stock.gt(0)),
        Some(false) => condition = condition.add(entity::Column::Stock.eq(0)),
        None => {}
    }

    let mut order = Vec::new();
    if let Some(sort) = filter.price_sort.as_deref() {
        if let Ok(sort) = sort.parse::<PriceSort>() {
            let direction = match sort {
                PriceSort::Asc => Order::Asc,
                PriceSort::Desc => Order::Desc,
            };
            order.push((entity::Column::Price, direction));
        }
    }

    CompiledQuery {
        condition,
        order,
        limit: filter.limit,
        offset: filter.offset,
    }
}
