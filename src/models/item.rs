use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ItemModel {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub min_quantity: i32,
    pub unit: String,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemModel {
    /// Low-stock rule: a threshold of zero disables the flag.
    pub fn is_low_stock(&self) -> bool {
        self.min_quantity > 0 && self.quantity < self.min_quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(quantity: i32, min_quantity: i32) -> ItemModel {
        ItemModel {
            id: "i1".into(),
            organization_id: "o1".into(),
            name: "screws".into(),
            description: String::new(),
            quantity,
            min_quantity,
            unit: "pcs".into(),
            category_id: None,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_low_stock_flag() {
        assert!(item(2, 5).is_low_stock());
        assert!(!item(5, 5).is_low_stock());
        assert!(!item(0, 0).is_low_stock());
    }
}
