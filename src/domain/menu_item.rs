//! Menu Item Entity
//!
//! A leaf attached to exactly one subcategory.

use serde::{Deserialize, Serialize};
use super::entity::{DomainError, DomainResult, Entity};

pub const MIN_MENU_ITEM_NAME_LEN: usize = 3;

/// Dish classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DishType {
    #[default]
    Veg,
    NonVeg,
    Egg,
}

impl DishType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DishType::Veg => "VEG",
            DishType::NonVeg => "NON_VEG",
            DishType::Egg => "EGG",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "NON_VEG" => DishType::NonVeg,
            "EGG" => DishType::Egg,
            _ => DishType::Veg,
        }
    }
}

/// Where a dish can be served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Serviceability {
    pub delivery: bool,
    pub takeaway: bool,
    pub dine_in: bool,
}

impl Default for Serviceability {
    fn default() -> Self {
        Self {
            delivery: true,
            takeaway: false,
            dine_in: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: u32,
    pub restaurant_id: u32,
    /// Owning subcategory
    pub category_id: u32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    /// Percentage, 0-100
    pub tax_rate: f64,
    pub dish_type: DishType,
    pub sort_order: f64,
    /// Availability flag
    pub is_active: bool,
    pub services: Serviceability,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl MenuItem {
    pub fn new(id: u32, restaurant_id: u32, category_id: u32, name: String, price: f64) -> Self {
        Self {
            id,
            restaurant_id,
            category_id,
            name,
            description: None,
            price,
            tax_rate: 5.0,
            dish_type: DishType::default(),
            sort_order: 0.0,
            is_active: true,
            services: Serviceability::default(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Check field-level constraints before a write
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().chars().count() < MIN_MENU_ITEM_NAME_LEN {
            return Err(DomainError::InvalidInput(format!(
                "Dish name must be {} characters long",
                MIN_MENU_ITEM_NAME_LEN
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::InvalidInput(format!("Invalid price {}", self.price)));
        }
        if !(0.0..=100.0).contains(&self.tax_rate) {
            return Err(DomainError::InvalidInput("Tax must be between 0 and 100".to_string()));
        }
        Ok(())
    }
}

impl Entity for MenuItem {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_item_defaults() {
        let item = MenuItem::new(1, 10, 5, "Paneer Tikka".to_string(), 12.5);
        assert_eq!(item.id(), 1);
        assert_eq!(item.dish_type, DishType::Veg);
        assert!(item.services.delivery);
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_menu_item_validation() {
        let mut item = MenuItem::new(1, 10, 5, "Ab".to_string(), 1.0);
        assert!(item.validate().is_err());
        item.name = "Dal".to_string();
        item.tax_rate = 101.0;
        assert!(item.validate().is_err());
        item.tax_rate = 0.0;
        item.price = f64::NAN;
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_dish_type_round_trip() {
        assert_eq!(DishType::NonVeg.as_str(), "NON_VEG");
        assert_eq!(DishType::from_str("EGG"), DishType::Egg);
        assert_eq!(DishType::from_str("unknown"), DishType::Veg);
    }
}
