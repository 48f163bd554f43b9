//! Local shopping cart
//!
//! Lines are keyed by book id. The cart remembers the price the customer saw;
//! checkout sends that price and the server rejects it if the catalog moved.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{BookSummary, CartLine};

use crate::ClientResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub book_id: i64,
    pub sku: String,
    pub title: String,
    pub price: Decimal,
    pub quantity: i64,
}

impl CartItem {
    pub fn from_book(book: &BookSummary, quantity: i64) -> Self {
        Self {
            book_id: book.id,
            sku: book.sku.clone(),
            title: book.title.clone(),
            price: book.price,
            quantity,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of copies across all lines
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Add a line, merging quantity into an existing line for the same book
    ///
    /// Non-positive quantities are ignored. A merged line takes the newer
    /// title and price.
    pub fn add(&mut self, item: CartItem) {
        if item.quantity <= 0 {
            return;
        }
        match self.items.iter_mut().find(|i| i.book_id == item.book_id) {
            Some(existing) => {
                existing.quantity += item.quantity;
                existing.price = item.price;
                existing.title = item.title;
            }
            None => self.items.push(item),
        }
    }

    /// Returns false if the book was not in the cart
    pub fn remove(&mut self, book_id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.book_id != book_id);
        self.items.len() != before
    }

    /// Set a line's quantity; zero or less removes it
    pub fn update_quantity(&mut self, book_id: i64, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove(book_id);
        }
        match self.items.iter_mut().find(|i| i.book_id == book_id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of line totals (before tax and shipping)
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(CartItem::line_total)
            .sum::<Decimal>()
            .round_dp(2)
    }

    pub fn to_checkout_lines(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .map(|i| CartLine {
                id: i.book_id,
                quantity: i.quantity,
                price: i.price,
            })
            .collect()
    }

    /// Load a saved cart; a missing file is an empty cart
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ClientResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;
    use std::str::FromStr;

    fn item(book_id: i64, price: &str, quantity: i64) -> CartItem {
        CartItem {
            book_id,
            sku: format!("SKU-{book_id}"),
            title: format!("Book {book_id}"),
            price: Decimal::from_str(price).unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_add_merges_quantity() {
        let mut cart = Cart::new();
        cart.add(item(1, "100.00", 1));
        cart.add(item(2, "25.50", 2));
        cart.add(item(1, "100.00", 2));
        cart.add(item(3, "9.99", 0));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.total(), Decimal::from_str("351.00").unwrap());
    }

    #[test]
    fn test_update_quantity_and_remove() {
        let mut cart = Cart::new();
        cart.add(item(1, "10.00", 1));
        cart.add(item(2, "20.00", 1));

        assert!(cart.update_quantity(1, 4));
        assert_eq!(cart.total(), Decimal::from_str("60.00").unwrap());
        assert!(!cart.update_quantity(9, 1));

        assert!(cart.update_quantity(2, 0));
        assert_eq!(cart.items().len(), 1);
        assert!(!cart.remove(2));
        assert!(cart.remove(1));
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_to_checkout_lines() {
        let mut cart = Cart::new();
        cart.add(item(7, "45.00", 2));
        let lines = cart.to_checkout_lines();
        assert_eq!(
            lines,
            vec![CartLine {
                id: 7,
                quantity: 2,
                price: Decimal::from_str("45.00").unwrap(),
            }]
        );
        cart.clear();
        assert!(cart.to_checkout_lines().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("cart.json");

        assert!(Cart::load(&path).unwrap().is_empty());

        let mut cart = Cart::new();
        cart.add(item(1, "120.00", 1));
        cart.add(item(2, "60.50", 3));
        cart.save(&path).unwrap();

        let loaded = Cart::load(&path).unwrap();
        assert_eq!(loaded.item_count(), 4);
        assert_eq!(loaded.total(), cart.total());

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Cart::load(&path), Err(ClientError::Serialization(_))));
    }
}
