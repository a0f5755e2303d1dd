//! Product registry
//!
//! Owns product identity and metadata. Quantity is a cached balance: the
//! registry never writes it directly and exposes no raw set-quantity
//! operation — every quantity change is delegated to the movement ledger.

use std::sync::Arc;

use chrono::Utc;
use shared::{
    validate_new_product, validate_price, validate_product_name, validate_threshold,
    CollectionKind, CreateProductInput, MovementReason, MovementType, NewMovement, Product, Scope,
    UpdateProductInput,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ledger::MovementLedger;
use crate::store::{load_collection, save_collection, CollectionStore};

pub struct ProductRegistry {
    store: Arc<dyn CollectionStore>,
    scope: Scope,
    ledger: Arc<MovementLedger>,
}

impl ProductRegistry {
    pub fn new(store: Arc<dyn CollectionStore>, scope: Scope, ledger: Arc<MovementLedger>) -> Self {
        Self { store, scope, ledger }
    }

    fn products_key(&self) -> String {
        self.scope.collection_key(CollectionKind::Products)
    }

    async fn load_products(&self) -> AppResult<Vec<Product>> {
        load_collection(self.store.as_ref(), &self.products_key()).await
    }

    async fn save_products(&self, products: &[Product]) -> AppResult<()> {
        save_collection(self.store.as_ref(), &self.products_key(), products).await
    }

    pub async fn list(&self) -> AppResult<Vec<Product>> {
        self.load_products().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Product> {
        self.load_products()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Case-insensitive search over name, description and category
    pub async fn search(&self, query: &str) -> AppResult<Vec<Product>> {
        let query = query.to_lowercase();
        let mut products = self.load_products().await?;
        products.retain(|p| {
            p.name.to_lowercase().contains(&query)
                || p.description.to_lowercase().contains(&query)
                || p.category.to_lowercase().contains(&query)
        });
        Ok(products)
    }

    pub async fn by_category(&self, category: &str) -> AppResult<Vec<Product>> {
        let mut products = self.load_products().await?;
        products.retain(|p| p.category == category);
        Ok(products)
    }

    pub async fn unique_categories(&self) -> AppResult<Vec<String>> {
        let products = self.load_products().await?;
        let mut categories: Vec<String> = products.into_iter().map(|p| p.category).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    pub async fn out_of_stock(&self) -> AppResult<Vec<Product>> {
        let mut products = self.load_products().await?;
        products.retain(|p| p.quantity == 0);
        Ok(products)
    }

    pub async fn low_stock(&self, threshold: i64) -> AppResult<Vec<Product>> {
        validate_threshold(threshold).map_err(|message| {
            AppError::validation("threshold", message, "Le seuil ne peut pas être négatif")
        })?;
        let mut products = self.load_products().await?;
        products.retain(|p| p.quantity > 0 && p.quantity <= threshold);
        Ok(products)
    }

    /// Create a product together with its initial-stock movement, as one
    /// logical operation
    ///
    /// The product row is persisted with quantity 0, then any positive
    /// initial quantity is recorded as an incoming `initial-stock`
    /// movement (`stock_before = 0`) which writes the cached quantity.
    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        validate_new_product(&input).map_err(|message| {
            AppError::validation("product", message, "Produit invalide")
        })?;

        let _guard = self.ledger.acquire_write_lock().await?;

        let product = Product {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            category: input.category,
            brand: input.brand,
            purchase_price: input.purchase_price,
            selling_price: input.selling_price,
            quantity: 0,
            created_at: Utc::now(),
        };

        let mut products = self.load_products().await?;
        products.push(product.clone());
        self.save_products(&products).await?;

        tracing::info!(product_id = %product.id, name = %product.name, "product created");

        if input.initial_quantity > 0 {
            let movement = self
                .ledger
                .record_locked(NewMovement::new(
                    product.id,
                    MovementType::Incoming,
                    input.initial_quantity,
                    MovementReason::InitialStock,
                ))
                .await?;
            return Ok(Product {
                quantity: movement.stock_after,
                ..product
            });
        }

        Ok(product)
    }

    /// Update non-quantity fields only
    pub async fn update_metadata(&self, id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        if let Some(name) = &input.name {
            validate_product_name(name).map_err(|message| {
                AppError::validation("name", message, "Nom de produit invalide")
            })?;
        }
        for price in [input.purchase_price, input.selling_price].into_iter().flatten() {
            validate_price(price).map_err(|message| {
                AppError::validation("price", message, "Le prix ne peut pas être négatif")
            })?;
        }

        let _guard = self.ledger.acquire_write_lock().await?;

        let mut products = self.load_products().await?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if let Some(name) = input.name {
            product.name = name;
        }
        if let Some(description) = input.description {
            product.description = description;
        }
        if let Some(category) = input.category {
            product.category = category;
        }
        if let Some(brand) = input.brand {
            product.brand = brand;
        }
        if let Some(purchase_price) = input.purchase_price {
            product.purchase_price = purchase_price;
        }
        if let Some(selling_price) = input.selling_price {
            product.selling_price = selling_price;
        }

        let updated = product.clone();
        self.save_products(&products).await?;
        Ok(updated)
    }

    /// Delete a product; its movements are retained for audit
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let _guard = self.ledger.acquire_write_lock().await?;

        let mut products = self.load_products().await?;
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(AppError::NotFound("Product".to_string()));
        }
        self.save_products(&products).await?;

        tracing::info!(product_id = %id, "product deleted, movements retained");
        Ok(())
    }
}
