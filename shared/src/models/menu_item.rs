//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Orderable menu item, as served by the menu catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price
    pub price: Decimal,
    /// Image reference (URL or asset path)
    #[serde(default, alias = "image_ref")]
    pub image: String,
    pub category: String,
    #[serde(alias = "isVeg")]
    pub is_veg: bool,
}

impl MenuItem {
    /// Minimal constructor, mostly for catalogs built in code
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            image: String::new(),
            category: category.into(),
            is_veg: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn veg(mut self, is_veg: bool) -> Self {
        self.is_veg = is_veg;
        self
    }
}

/// Filter a catalog by category; `"All"` (or an empty string) keeps everything
pub fn filter_by_category<'a>(items: &'a [MenuItem], category: &str) -> Vec<&'a MenuItem> {
    if category.is_empty() || category.eq_ignore_ascii_case("all") {
        return items.iter().collect();
    }
    items.iter().filter(|item| item.category == category).collect()
}

/// Distinct categories in catalog order
pub fn categories(items: &[MenuItem]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for item in items {
        if !seen.contains(&item.category.as_str()) {
            seen.push(&item.category);
        }
    }
    seen
}
