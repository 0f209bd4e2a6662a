//! Built-in demo menu
//!
//! Seeded into [`MemoryBackend`](crate::MemoryBackend) for demos and tests.
//! A hosted deployment serves its own menu through `fetch_menu`.

use rust_decimal::Decimal;
use shared::models::MenuItem;

/// Category filter labels in display order; "All" disables filtering
pub const CATEGORIES: [&str; 5] = ["All", "Starters", "Main Course", "Beverages", "Desserts"];

// (id, name, description, price, image, category, veg)
const ITEMS: [(&str, &str, &str, i64, &str, &str, bool); 13] = [
    ("1", "Garlic Bread", "Crispy bread with butter and garlic", 425, "/garlic-bread-appetizer.jpg", "Starters", true),
    ("2", "Bruschetta", "Toasted bread with tomato and basil", 510, "/bruschetta-starter.jpg", "Starters", true),
    ("3", "Spring Rolls", "Crispy rolls with vegetable filling", 595, "/spring-rolls-appetizer.jpg", "Starters", true),
    ("4", "Grilled Chicken", "Herb-marinated grilled chicken breast", 1100, "/grilled-chicken-main-course.jpg", "Main Course", false),
    ("5", "Pasta Carbonara", "Classic pasta with creamy sauce", 935, "/pasta-carbonara-main-dish.jpg", "Main Course", true),
    ("6", "Salmon Fillet", "Pan-seared salmon with lemon butter", 1275, "/salmon-fillet-main-course.jpg", "Main Course", false),
    ("7", "Veggie Burger", "Plant-based patty with fresh toppings", 850, "/veggie-burger-vegetarian.jpg", "Main Course", true),
    ("8", "Iced Coffee", "Cold brew with ice and cream", 340, "/iced-coffee-beverage.jpg", "Beverages", true),
    ("9", "Fresh Lemonade", "Freshly squeezed with mint", 300, "/fresh-lemonade-drink.jpg", "Beverages", true),
    ("10", "Chocolate Shake", "Creamy chocolate shake with whipped cream", 425, "/chocolate-shake-beverage.jpg", "Beverages", true),
    ("11", "Chocolate Cake", "Rich chocolate cake with ganache", 510, "/chocolate-cake-dessert.jpg", "Desserts", true),
    ("12", "Cheesecake", "New York style with berry topping", 595, "/cheesecake-dessert.jpg", "Desserts", true),
    ("13", "Tiramisu", "Traditional Italian dessert", 465, "/tiramisu-italian-dessert.jpg", "Desserts", true),
];

pub fn demo_catalog() -> Vec<MenuItem> {
    ITEMS
        .iter()
        .map(|&(id, name, description, price, image, category, veg)| {
            MenuItem::new(id, name, Decimal::from(price), category)
                .with_description(description)
                .with_image(image)
                .veg(veg)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{categories, filter_by_category};
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_unique() {
        let menu = demo_catalog();
        assert_eq!(menu.len(), 13);
        let ids: HashSet<_> = menu.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids.len(), menu.len());
    }

    #[test]
    fn test_categories_match_labels() {
        let menu = demo_catalog();
        let found = categories(&menu);
        assert_eq!(found, CATEGORIES[1..].to_vec());
        assert_eq!(filter_by_category(&menu, "Desserts").len(), 3);
        assert_eq!(filter_by_category(&menu, "All").len(), 13);
    }

    #[test]
    fn test_non_veg_items() {
        let menu = demo_catalog();
        let non_veg: Vec<_> = menu.iter().filter(|i| !i.is_veg).map(|i| i.name.as_str()).collect();
        assert_eq!(non_veg, vec!["Grilled Chicken", "Salmon Fillet"]);
    }
}
