use std::result::Result as DefaultResult;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::constant::hard_limit;
use crate::error::{AppError, AppErrorCode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewModel {
    pub id: u64,
    pub product_id: u64,
    pub user_id: u64,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewModel {
    pub fn check_rating(&self) -> DefaultResult<(), AppError> {
        if (1..=hard_limit::MAX_REVIEW_RATING).contains(&self.rating) {
            Ok(())
        } else {
            let detail = format!("review-rating:{}", self.rating);
            Err(AppError::new(AppErrorCode::InvalidInput, detail))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRating {
    /// rounded to one decimal place
    pub average: Decimal,
    pub count: u32,
}

impl ReviewRating {
    pub fn from_reviews(reviews: &[ReviewModel]) -> Self {
        if reviews.is_empty() {
            return Self {
                average: Decimal::ZERO,
                count: 0,
            };
        }
        let count = reviews.len() as u32;
        let sum = reviews
            .iter()
            .map(|r| Decimal::from(r.rating))
            .sum::<Decimal>();
        let average = (sum / Decimal::from(count))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        Self { average, count }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPage {
    pub current_page: u32,
    pub total_pages: u32,
    pub reviews: Vec<ReviewModel>,
}
