//! Product repository for database operations.

use sqlx::PgPool;

use sugarcane_core::ProductId;

use crate::db::RepositoryError;
use crate::models::{NewProduct, Product, ProductUpdate};

const PRODUCT_COLUMNS: &str =
    "id, name, category, price, description, stock, created_at, updated_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO product (id, name, category, price, description, stock) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PRODUCT_COLUMNS}"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(ProductId::generate())
            .bind(&new.name)
            .bind(&new.category)
            .bind(new.price)
            .bind(new.description.as_deref())
            .bind(new.stock)
            .fetch_one(self.pool)
            .await?;

        Ok(product)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(product)
    }

    /// Get a product by exact name.
    ///
    /// Names are not unique; the oldest match wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM product \
             WHERE name = $1 ORDER BY created_at ASC LIMIT 1"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(name)
            .fetch_optional(self.pool)
            .await?;

        Ok(product)
    }

    /// List the whole catalog, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM product ORDER BY created_at ASC");

        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(products)
    }

    /// List products currently available for sale (stock > 0).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_in_stock(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM product \
             WHERE stock > 0 ORDER BY created_at ASC"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(products)
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            "UPDATE product SET \
                 name = COALESCE($2, name), \
                 category = COALESCE($3, category), \
                 price = COALESCE($4, price), \
                 description = COALESCE($5, description), \
                 stock = COALESCE($6, stock), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        );

        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(update.name.as_deref())
            .bind(update.category.as_deref())
            .bind(update.price)
            .bind(update.description.as_deref())
            .bind(update.stock)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
