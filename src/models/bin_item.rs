use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of a bin's contents, joined with the item it references.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BinItemRow {
    pub item_id: String,
    pub name: String,
    pub unit: String,
    pub quantity: i32,
    pub notes: String,
    pub item_quantity: i32,
    pub item_min_quantity: i32,
}

impl BinItemRow {
    pub fn is_low_stock(&self) -> bool {
        self.item_min_quantity > 0 && self.item_quantity < self.item_min_quantity
    }
}
