use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::events::Event;
use crate::records::Product;
use crate::store::{delete_record, fetch_all, insert_record, save_record, Direction, Query, RecordStore};
use crate::types::{ProductCategory, ProductId, SessionContext};

use super::CollectionsService;

/// input for a new catalogue product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Money,
    pub category: ProductCategory,
    pub stock: u32,
}

/// stock figures for the catalogue
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InventorySummary {
    pub products: u32,
    pub units_in_stock: u32,
    /// Σ unit price × stock
    pub stock_value: Money,
    pub out_of_stock: u32,
}

impl<S: RecordStore> CollectionsService<S> {
    pub fn create_product(&mut self, ctx: &SessionContext, input: NewProduct) -> Result<Product> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(BillingError::validation("product name is required"));
        }
        if !input.unit_price.is_positive() {
            return Err(BillingError::validation(format!(
                "unit price must be positive, got {}",
                input.unit_price
            )));
        }

        let product = Product {
            id: Uuid::new_v4(),
            organization_id: ctx.organization_id,
            name: name.to_string(),
            description: input.description,
            unit_price: input.unit_price.round_currency(self.currency_decimals()),
            category: input.category,
            stock: input.stock,
        };
        let product = insert_record(&mut self.store, &product)?;

        info!(product_id = %product.id, name = %product.name, stock = product.stock, "product created");
        Ok(product)
    }

    pub fn product(&self, ctx: &SessionContext, id: ProductId) -> Result<Product> {
        self.load_owned(ctx, id, |p: &Product| p.organization_id)
    }

    pub fn products(&self, ctx: &SessionContext) -> Result<Vec<Product>> {
        fetch_all(
            &self.store,
            &Query::new()
                .eq("organization_id", ctx.organization_id)
                .order_by("name", Direction::Ascending),
        )
    }

    /// add (or with a negative delta, remove) units; stock never goes below zero
    pub fn adjust_stock(&mut self, ctx: &SessionContext, id: ProductId, delta: i64) -> Result<Product> {
        let mut product = self.product(ctx, id)?;
        let old_stock = product.stock;

        let new_stock = i64::from(old_stock) + delta;
        if new_stock < 0 {
            return Err(BillingError::constraint(format!(
                "{} has {} unit(s) in stock, cannot remove {}",
                product.name,
                old_stock,
                delta.unsigned_abs()
            )));
        }
        product.stock = u32::try_from(new_stock)
            .map_err(|_| BillingError::validation(format!("stock {} out of range", new_stock)))?;
        save_record(&mut self.store, &product)?;

        info!(product_id = %product.id, old_stock, new_stock = product.stock, "stock adjusted");
        self.events.emit(Event::ProductStockAdjusted {
            product_id: product.id,
            old_stock,
            new_stock: product.stock,
        });
        Ok(product)
    }

    /// remove a product; transactions that referenced it keep a generic label
    pub fn delete_product(&mut self, ctx: &SessionContext, id: ProductId) -> Result<()> {
        let product = self.product(ctx, id)?;
        delete_record::<Product, _>(&mut self.store, product.id)?;
        info!(product_id = %product.id, operator = %ctx.operator, "product deleted");
        Ok(())
    }

    pub fn inventory_summary(&self, ctx: &SessionContext) -> Result<InventorySummary> {
        let products = self.products(ctx)?;

        Ok(products.iter().fold(InventorySummary::default(), |mut summary, product| {
            summary.products += 1;
            summary.units_in_stock += product.stock;
            summary.stock_value += product.unit_price * Decimal::from(product.stock);
            if product.stock == 0 {
                summary.out_of_stock += 1;
            }
            summary
        }))
    }
}
