//! Product repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Expose create/read/update/delete and filtered listing over `products`.
//! - Keep SQL and column encoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths run `Product::validate()` before any SQL mutation.
//! - Identifiers come from SQLite; callers never choose them.
//! - Read paths reject corrupt persisted rows instead of masking them.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::product::{Product, ProductId, ProductValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const PRODUCT_SELECT_SQL: &str = "SELECT id, name, price, description FROM products";
const PRODUCT_TABLE: &str = "products";
const PRODUCT_COLUMNS: &[&str] = &["id", "name", "price", "description"];

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ProductValidationError),
    Db(DbError),
    NotFound(ProductId),
    /// Update was attempted on a product the store never assigned an id to.
    MissingId,
    /// Create was attempted on a product that already has an id.
    IdAlreadyAssigned(ProductId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "product not found: {id}"),
            Self::MissingId => write!(f, "product has no id; create it before updating"),
            Self::IdAlreadyAssigned(id) => {
                write!(f, "product already has id {id}; ids are assigned by the store")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted product data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is below required {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProductValidationError> for RepoError {
    fn from(value: ProductValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter and pagination options for listing products.
#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    /// Case-insensitive (ASCII) substring match on `name`.
    pub name_contains: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for the product collection.
pub trait ProductRepository {
    fn create_product(&self, product: &Product) -> RepoResult<ProductId>;
    fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>>;
    fn update_product(&self, product: &Product) -> RepoResult<()>;
    fn delete_product(&self, id: ProductId) -> RepoResult<()>;
    fn list_products(&self, query: &ProductListQuery) -> RepoResult<Vec<Product>>;
    fn count_products(&self) -> RepoResult<u64>;
}

/// SQLite-backed product repository borrowing an open connection.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    /// Wraps a connection after checking it carries the product schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `Db(UnsupportedSchemaVersion)` when a newer build wrote the schema.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   version is current but the table shape is not.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_version(conn)?;
        if actual_version < expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        if actual_version > expected_version {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version: actual_version,
                latest_supported: expected_version,
            }
            .into());
        }

        ensure_products_schema(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection already verified by `try_new`.
    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn create_product(&self, product: &Product) -> RepoResult<ProductId> {
        if let Some(id) = product.id {
            return Err(RepoError::IdAlreadyAssigned(id));
        }
        product.validate()?;

        self.conn.execute(
            "INSERT INTO products (name, price, description) VALUES (?1, ?2, ?3);",
            params![
                product.name.as_str(),
                product.price.to_string(),
                product.description.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>> {
        let product = self
            .conn
            .query_row(
                &format!("{PRODUCT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_product_row(row)),
            )
            .optional()?;

        product.transpose()
    }

    fn update_product(&self, product: &Product) -> RepoResult<()> {
        let id = product.id.ok_or(RepoError::MissingId)?;
        product.validate()?;

        let changed = self.conn.execute(
            "UPDATE products
             SET
                name = ?1,
                price = ?2,
                description = ?3
             WHERE id = ?4;",
            params![
                product.name.as_str(),
                product.price.to_string(),
                product.description.as_str(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_product(&self, id: ProductId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM products WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list_products(&self, query: &ProductListQuery) -> RepoResult<Vec<Product>> {
        let mut sql = format!("{PRODUCT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(needle) = query.name_contains.as_deref() {
            sql.push_str(" AND instr(lower(name), lower(?)) > 0");
            bind_values.push(Value::Text(needle.to_string()));
        }

        sql.push_str(" ORDER BY id ASC");

        // Price bounds compare as exact `Decimal` values in Rust, so paging
        // runs after the bound filter whenever one is set.
        let price_bounded = query.min_price.is_some() || query.max_price.is_some();
        if !price_bounded {
            if let Some(limit) = query.limit {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
                if query.offset > 0 {
                    sql.push_str(" OFFSET ?");
                    bind_values.push(Value::Integer(i64::from(query.offset)));
                }
            } else if query.offset > 0 {
                sql.push_str(" LIMIT -1 OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut products = Vec::new();
        let mut skipped: u32 = 0;

        while let Some(row) = rows.next()? {
            if price_bounded
                && query
                    .limit
                    .is_some_and(|limit| products.len() >= limit as usize)
            {
                break;
            }

            let product = parse_product_row(row)?;
            if price_bounded {
                if !price_in_bounds(product.price, query) {
                    continue;
                }
                if skipped < query.offset {
                    skipped += 1;
                    continue;
                }
            }
            products.push(product);
        }

        Ok(products)
    }

    fn count_products(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative product count `{count}`")))
    }
}

fn price_in_bounds(price: Decimal, query: &ProductListQuery) -> bool {
    query.min_price.map_or(true, |min| price >= min)
        && query.max_price.map_or(true, |max| price <= max)
}

fn ensure_products_schema(conn: &Connection) -> RepoResult<()> {
    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [PRODUCT_TABLE],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(PRODUCT_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let present = stmt
        .query_map([PRODUCT_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(column) = PRODUCT_COLUMNS
        .iter()
        .copied()
        .find(|column| !present.iter().any(|name| name.as_str() == *column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: PRODUCT_TABLE,
            column,
        });
    }

    Ok(())
}

fn parse_product_row(row: &Row<'_>) -> RepoResult<Product> {
    let id: ProductId = row.get("id")?;

    let price_text: String = row.get("price")?;
    let price = Decimal::from_str(&price_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid price value `{price_text}` in products.price for id {id}"
        ))
    })?;

    let product = Product {
        id: Some(id),
        name: row.get("name")?,
        price,
        description: row.get("description")?,
    };
    product.validate().map_err(|err| {
        RepoError::InvalidData(format!("product {id} violates field rules: {err}"))
    })?;
    Ok(product)
}
