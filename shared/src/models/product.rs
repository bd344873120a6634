//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product review left by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Reviewing user reference (String ID)
    pub user: String,
    /// Rating in [1, 5]
    pub rating: u8,
    pub comment: String,
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<String>,
    pub name: String,
    /// Unit price in currency units (non-negative)
    pub price: Decimal,
    /// Units available for ordering (never negative)
    pub count_in_stock: u32,
    /// Average of review ratings, 0.0 when unreviewed
    pub rating: f64,
    pub reviews: Vec<Review>,
}

impl Product {
    /// Recompute `rating` from the current review sequence
    pub fn recalculate_rating(&mut self) {
        if self.reviews.is_empty() {
            self.rating = 0.0;
            return;
        }
        let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
        self.rating = f64::from(sum) / self.reviews.len() as f64;
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub price: Decimal,
    pub count_in_stock: u32,
}
