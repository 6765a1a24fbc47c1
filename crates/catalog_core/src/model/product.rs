//! Product domain model.
//!
//! # Responsibility
//! - Define the stored shape of a catalog product.
//! - Carry field constraints as declarative `validator` metadata.
//!
//! # Invariants
//! - `id` is `None` until the store assigns one, and never changes afterwards.
//! - `name` is non-blank and at most 100 characters.
//! - `price` is at least 0.01.
//! - `description` is at most 500 characters and defaults to empty.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};
use validator::{Validate, ValidationError, ValidationErrors};

/// Store-assigned product identifier (SQLite rowid).
pub type ProductId = i64;

/// Mirrors the `length(max = ...)` literal on `Product::name`.
pub const NAME_MAX_CHARS: u64 = 100;
/// Mirrors the `length(max = ...)` literal on `Product::description`.
pub const DESCRIPTION_MAX_CHARS: u64 = 500;

/// Smallest accepted price: 0.01.
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Catalog product record.
///
/// Constraint checks live in the `#[validate]` attributes; the struct itself
/// performs no validation when built or mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Product {
    /// Assigned by the store on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    #[validate(
        custom(function = "validate_name_required"),
        length(max = 100, message = "Name cannot exceed 100 characters.")
    )]
    pub name: String,
    #[validate(custom(function = "validate_price_range"))]
    pub price: Decimal,
    #[serde(default)]
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters."))]
    pub description: String,
}

impl Product {
    /// Creates an unsaved product with an empty description.
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: None,
            name: name.into(),
            price,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Runs the declared field constraints.
    ///
    /// # Errors
    /// - Returns every violated rule, ordered by field then rule code.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        Validate::validate(self).map_err(ProductValidationError::from)
    }

    /// Returns whether the store has assigned an identifier.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

fn validate_name_required(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed("Product name is required."));
        return Err(err);
    }
    Ok(())
}

fn validate_price_range(price: &Decimal) -> Result<(), ValidationError> {
    if *price < MIN_PRICE {
        let mut err = ValidationError::new("range");
        err.message = Some(Cow::Borrowed("Price must be greater than 0."));
        return Err(err);
    }
    Ok(())
}

/// One violated field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    /// Rule identifier: `required`, `length` or `range`.
    pub code: String,
    pub message: String,
}

/// Validation failure for a product, listing every violated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductValidationError {
    violations: Vec<FieldViolation>,
}

impl ProductValidationError {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Returns whether `field` broke the rule identified by `code`.
    pub fn has_violation(&self, field: &str, code: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field && violation.code == code)
    }
}

impl From<ValidationErrors> for ProductValidationError {
    fn from(value: ValidationErrors) -> Self {
        let mut violations: Vec<FieldViolation> = value
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = field.to_string();
                errors.iter().map(move |err| FieldViolation {
                    field: field.clone(),
                    code: err.code.to_string(),
                    message: err
                        .message
                        .as_ref()
                        .map_or_else(|| err.code.to_string(), |message| message.to_string()),
                })
            })
            .collect();
        violations.sort_by(|a, b| (&a.field, &a.code).cmp(&(&b.field, &b.code)));
        Self { violations }
    }
}

impl Display for ProductValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self
            .violations
            .iter()
            .map(|violation| violation.message.as_str())
            .collect();
        write!(f, "product validation failed: {}", messages.join(" "))
    }
}

impl Error for ProductValidationError {}

#[cfg(test)]
mod tests {
    use super::{Product, DESCRIPTION_MAX_CHARS, MIN_PRICE, NAME_MAX_CHARS};
    use rust_decimal::Decimal;

    #[test]
    fn min_price_is_one_cent() {
        assert_eq!(MIN_PRICE, Decimal::new(1, 2));
        assert_eq!(MIN_PRICE.to_string(), "0.01");
    }

    #[test]
    fn multiple_violations_are_sorted_by_field() {
        let product = Product::new("", Decimal::ZERO).with_description("d".repeat(501));
        let err = product.validate().unwrap_err();

        let fields: Vec<&str> = err
            .violations()
            .iter()
            .map(|violation| violation.field.as_str())
            .collect();
        assert_eq!(fields, vec!["description", "name", "price"]);
    }

    #[test]
    fn declared_length_limits_match_constants() {
        let name_limit = NAME_MAX_CHARS as usize;
        Product::new("n".repeat(name_limit), MIN_PRICE)
            .validate()
            .unwrap();
        let err = Product::new("n".repeat(name_limit + 1), MIN_PRICE)
            .validate()
            .unwrap_err();
        assert!(err.has_violation("name", "length"));
        assert!(err.violations()[0]
            .message
            .contains(&NAME_MAX_CHARS.to_string()));

        let description_limit = DESCRIPTION_MAX_CHARS as usize;
        Product::new("Widget", MIN_PRICE)
            .with_description("d".repeat(description_limit))
            .validate()
            .unwrap();
        let err = Product::new("Widget", MIN_PRICE)
            .with_description("d".repeat(description_limit + 1))
            .validate()
            .unwrap_err();
        assert!(err.has_violation("description", "length"));
        assert!(err.violations()[0]
            .message
            .contains(&DESCRIPTION_MAX_CHARS.to_string()));
    }
}
