//! Cart engine
//!
//! Pure in-memory cart. Every operation is total: unknown ids are ignored,
//! never errors. Callers persist the cart after each mutation.
//!
//! Invariants:
//! - at most one line per item id
//! - every line has quantity >= 1
//! - line order is insertion order (display only)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::MenuItem;
use shared::order::{CartLine, money};

/// Aggregates shown next to the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    /// Σ quantity
    pub item_count: u32,
    /// Σ price × quantity
    pub subtotal: Decimal,
}

impl CartTotals {
    /// Subtotal with the fixed tax rate applied
    pub fn total(&self) -> Decimal {
        money::total_with_tax(self.subtotal)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from possibly unnormalized lines
    ///
    /// Duplicate ids are merged into the first occurrence and lines with a
    /// zero quantity are dropped.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            match cart.position(&line.item.id) {
                Some(idx) => {
                    let existing = &mut cart.lines[idx];
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }

    /// Increment the line for `item`, appending it with quantity 1 if absent
    pub fn add_item(&mut self, item: &MenuItem) {
        match self.position(&item.id) {
            Some(idx) => {
                let line = &mut self.lines[idx];
                line.quantity = line.quantity.saturating_add(1);
            }
            None => self.lines.push(CartLine::new(item.clone(), 1)),
        }
    }

    /// Overwrite the quantity for `id`; `quantity <= 0` removes the line
    pub fn set_quantity(&mut self, id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        if let Some(idx) = self.position(id) {
            self.lines[idx].quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    pub fn remove_item(&mut self, id: &str) {
        self.lines.retain(|line| line.item.id != id);
    }

    pub fn totals(&self) -> CartTotals {
        self.lines.iter().fold(CartTotals::default(), |acc, line| CartTotals {
            item_count: acc.item_count.saturating_add(line.quantity),
            subtotal: acc.subtotal + line.line_total(),
        })
    }

    pub fn quantity_of(&self, id: &str) -> u32 {
        self.position(id).map_or(0, |idx| self.lines[idx].quantity)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.item.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price: i64) -> MenuItem {
        MenuItem::new(id, format!("Item {id}"), Decimal::from(price), "Starters")
    }

    fn assert_invariants(cart: &Cart) {
        let mut ids: Vec<&str> = cart.lines().iter().map(|l| l.item.id.as_str()).collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before, "duplicate item id in cart");
        assert!(cart.lines().iter().all(|l| l.quantity >= 1));

        let expected: Decimal = cart
            .lines()
            .iter()
            .map(|l| l.item.price * Decimal::from(l.quantity))
            .sum();
        assert_eq!(cart.totals().subtotal, expected);
    }

    #[test]
    fn test_add_item_merges_by_id() {
        let mut cart = Cart::new();
        cart.add_item(&item("1", 425));
        cart.add_item(&item("8", 340));
        cart.add_item(&item("1", 425));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantity_of("1"), 2);
        assert_eq!(cart.quantity_of("8"), 1);
        assert_eq!(cart.lines()[0].item.id, "1");
        assert_invariants(&cart);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::new();
        cart.add_item(&item("1", 425));

        cart.set_quantity("1", 5);
        assert_eq!(cart.quantity_of("1"), 5);

        // Unknown id is a no-op
        cart.set_quantity("99", 3);
        assert_eq!(cart.len(), 1);

        cart.set_quantity("1", 0);
        assert!(cart.is_empty());

        cart.add_item(&item("2", 510));
        cart.set_quantity("2", -4);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::new();
        cart.add_item(&item("1", 425));
        cart.remove_item("missing");
        assert_eq!(cart.len(), 1);
        cart.remove_item("1");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals_reference_cart() {
        let mut cart = Cart::new();
        cart.add_item(&item("1", 425));
        cart.add_item(&item("1", 425));
        cart.add_item(&item("8", 340));

        let totals = cart.totals();
        assert_eq!(totals.item_count, 3);
        assert_eq!(totals.subtotal, Decimal::from(1190));
        assert_eq!(totals.total(), Decimal::new(130900, 2));
    }

    #[test]
    fn test_empty_totals() {
        let totals = Cart::new().totals();
        assert_eq!(totals.item_count, 0);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.total(), Decimal::ZERO);
    }

    #[test]
    fn test_invariants_hold_over_mixed_sequences() {
        let items: Vec<MenuItem> = (1..=5).map(|i| item(&i.to_string(), i * 100)).collect();
        let mut cart = Cart::new();

        // Deterministic pseudo-random walk over operations
        let mut seed: u64 = 0x5eed;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let pick = &items[(seed >> 33) as usize % items.len()];
            match (seed >> 13) % 4 {
                0 | 1 => cart.add_item(pick),
                2 => cart.set_quantity(&pick.id, ((seed >> 40) % 7) as i64 - 2),
                _ => cart.remove_item(&pick.id),
            }
            assert_invariants(&cart);
        }
    }

    #[test]
    fn test_from_lines_normalizes() {
        let cart = Cart::from_lines(vec![
            CartLine::new(item("1", 425), 1),
            CartLine::new(item("2", 510), 0),
            CartLine::new(item("1", 425), 2),
        ]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of("1"), 3);
    }

    #[test]
    fn test_serializes_as_sequence() {
        let mut cart = Cart::new();
        cart.add_item(&item("1", 425));
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["quantity"], 1);

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
