//! Cart aggregate implementation.

use chrono::{DateTime, Utc};
use common::OwnerId;
use serde::{Deserialize, Serialize};

use crate::value_objects::{MAX_LINE_QUANTITY, ProductRef};

use super::CartError;

/// A single cart line: a product reference and the quantity wanted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product this line refers to.
    pub product: ProductRef,

    /// Quantity wanted, always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// Creates a new cart line.
    pub fn new(product: impl Into<ProductRef>, quantity: u32) -> Self {
        Self {
            product: product.into(),
            quantity,
        }
    }
}

/// Cart aggregate root.
///
/// One active cart exists per owner. Lines are kept in insertion order and
/// never contain duplicate product references; re-adding a product merges
/// into the existing line by summing quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// The owning user or anonymous session.
    owner: OwnerId,

    /// Ordered list of lines, no duplicate products.
    lines: Vec<CartLine>,

    /// When the cart was last modified.
    updated_at: DateTime<Utc>,
}

// Query methods
impl Cart {
    /// Creates a new empty cart for an owner.
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            lines: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Returns the owning user.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Returns all lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns the line for a product, if present.
    pub fn line(&self, product: &ProductRef) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product == product)
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Returns when the cart was last modified.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Mutation methods
impl Cart {
    /// Adds a line, merging into an existing line for the same product.
    ///
    /// Merging sums quantities; the merged total must stay within the
    /// per-line cap.
    pub fn add_line(
        &mut self,
        product: impl Into<ProductRef>,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        let product = product.into();
        let merged = self
            .line(&product)
            .map(|l| l.quantity)
            .unwrap_or(0)
            .saturating_add(quantity);

        if merged > MAX_LINE_QUANTITY {
            return Err(CartError::LineQuantityCap {
                product,
                requested: merged,
                cap: MAX_LINE_QUANTITY,
            });
        }

        match self.lines.iter_mut().find(|l| l.product == product) {
            Some(line) => line.quantity = merged,
            None => self.lines.push(CartLine::new(product, quantity)),
        }
        self.touch();
        Ok(())
    }

    /// Replaces the quantity of an existing line.
    ///
    /// A quantity of 0 removes the line.
    pub fn set_line_quantity(
        &mut self,
        product: &ProductRef,
        quantity: u32,
    ) -> Result<(), CartError> {
        if self.line(product).is_none() {
            return Err(CartError::LineNotFound {
                product: product.clone(),
            });
        }

        if quantity == 0 {
            self.lines.retain(|l| &l.product != product);
            self.touch();
            return Ok(());
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::LineQuantityCap {
                product: product.clone(),
                requested: quantity,
                cap: MAX_LINE_QUANTITY,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| &l.product == product) {
            line.quantity = quantity;
        }
        self.touch();
        Ok(())
    }

    /// Removes a line.
    pub fn remove_line(&mut self, product: &ProductRef) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product != product);
        if self.lines.len() == before {
            return Err(CartError::LineNotFound {
                product: product.clone(),
            });
        }
        self.touch();
        Ok(())
    }

    /// Removes all lines. The cart document itself is kept.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        Cart::new(OwnerId::new())
    }

    #[test]
    fn test_new_cart_is_empty() {
        let cart = cart();
        assert!(cart.is_empty());
        assert_eq!(cart.line_count(), 0);
        assert_eq!(cart.total_quantity(), 0);
    }

    #[test]
    fn test_add_line() {
        let mut cart = cart();
        cart.add_line("SKU-001", 2).unwrap();

        assert_eq!(cart.line_count(), 1);
        let line = cart.line(&ProductRef::new("SKU-001")).unwrap();
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn test_add_same_product_merges_by_sum() {
        let mut cart = cart();
        cart.add_line("SKU-001", 2).unwrap();
        cart.add_line("SKU-001", 3).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.line(&ProductRef::new("SKU-001")).unwrap().quantity, 5);
    }

    #[test]
    fn test_add_line_zero_quantity_fails() {
        let mut cart = cart();
        let result = cart.add_line("SKU-001", 0);
        assert!(matches!(result, Err(CartError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_add_line_over_cap_fails() {
        let mut cart = cart();
        let result = cart.add_line("SKU-001", MAX_LINE_QUANTITY + 1);
        assert!(matches!(result, Err(CartError::LineQuantityCap { .. })));
    }

    #[test]
    fn test_merge_over_cap_fails_and_preserves_existing_line() {
        let mut cart = cart();
        cart.add_line("SKU-001", 60).unwrap();

        let result = cart.add_line("SKU-001", 50);
        assert!(matches!(
            result,
            Err(CartError::LineQuantityCap {
                requested: 110,
                ..
            })
        ));
        assert_eq!(cart.line(&ProductRef::new("SKU-001")).unwrap().quantity, 60);
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = cart();
        cart.add_line("SKU-002", 1).unwrap();
        cart.add_line("SKU-001", 1).unwrap();
        cart.add_line("SKU-002", 1).unwrap();

        let products: Vec<&str> = cart.lines().iter().map(|l| l.product.as_str()).collect();
        assert_eq!(products, vec!["SKU-002", "SKU-001"]);
    }

    #[test]
    fn test_set_line_quantity() {
        let mut cart = cart();
        cart.add_line("SKU-001", 2).unwrap();

        cart.set_line_quantity(&ProductRef::new("SKU-001"), 7).unwrap();
        assert_eq!(cart.line(&ProductRef::new("SKU-001")).unwrap().quantity, 7);
    }

    #[test]
    fn test_set_line_quantity_to_zero_removes_line() {
        let mut cart = cart();
        cart.add_line("SKU-001", 2).unwrap();

        cart.set_line_quantity(&ProductRef::new("SKU-001"), 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_line_quantity_missing_line_fails() {
        let mut cart = cart();
        let result = cart.set_line_quantity(&ProductRef::new("SKU-404"), 1);
        assert!(matches!(result, Err(CartError::LineNotFound { .. })));
    }

    #[test]
    fn test_remove_line() {
        let mut cart = cart();
        cart.add_line("SKU-001", 2).unwrap();
        cart.add_line("SKU-002", 1).unwrap();

        cart.remove_line(&ProductRef::new("SKU-001")).unwrap();
        assert_eq!(cart.line_count(), 1);
        assert!(cart.line(&ProductRef::new("SKU-001")).is_none());
    }

    #[test]
    fn test_remove_missing_line_fails() {
        let mut cart = cart();
        let result = cart.remove_line(&ProductRef::new("SKU-404"));
        assert!(matches!(result, Err(CartError::LineNotFound { .. })));
    }

    #[test]
    fn test_clear() {
        let mut cart = cart();
        cart.add_line("SKU-001", 2).unwrap();
        cart.add_line("SKU-002", 1).unwrap();

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_serialization() {
        let mut cart = cart();
        cart.add_line("SKU-001", 2).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        let deserialized: Cart = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.owner(), cart.owner());
        assert_eq!(deserialized.lines(), cart.lines());
    }
}
