use std::result::Result as DefaultResult;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constant::hard_limit;
use crate::error::{AppError, AppErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CouponDiscountType {
    Percentage,
    FixedAmount,
}

impl CouponDiscountType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FixedAmount => "fixed_amount",
        }
    }
}

impl FromStr for CouponDiscountType {
    type Err = AppError;
    fn from_str(s: &str) -> DefaultResult<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed_amount" => Ok(Self::FixedAmount),
            _others => Err(AppError::new(
                AppErrorCode::InvalidInput,
                format!("coupon-discount-type:{}", s),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponModel {
    pub id: u64,
    pub code: String,
    pub discount_type: CouponDiscountType,
    pub discount_value: Decimal,
    pub min_purchase: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_uses: Option<u32>,
    pub uses_count: u32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouponDiscountApplied {
    pub coupon_id: u64,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

impl CouponModel {
    /// field constraints checked on creation and update
    pub fn check_fields(&self) -> DefaultResult<(), AppError> {
        let reason = if self.code.trim().is_empty() {
            Some("coupon-code-empty")
        } else if self.discount_value <= Decimal::ZERO {
            Some("coupon-discount-not-positive")
        } else if self.discount_type == CouponDiscountType::Percentage
            && self.discount_value > Decimal::from(hard_limit::MAX_PERCENTAGE_DISCOUNT)
        {
            Some("coupon-percentage-exceed")
        } else if self.min_purchase < Decimal::ZERO {
            Some("coupon-min-purchase-negative")
        } else if self.start_date > self.end_date {
            Some("coupon-window-inverted")
        } else {
            None
        };
        match reason {
            Some(r) => Err(AppError::new(AppErrorCode::InvalidInput, r)),
            None => Ok(()),
        }
    }

    /// Check whether the coupon can be used for the amount at the given
    /// time. It does not modify anything, callers can evaluate it as many
    /// times as they need.
    pub fn validate(&self, total: Decimal, now: DateTime<Utc>) -> DefaultResult<(), AppError> {
        let reason = if !self.active {
            Some("coupon-inactive".to_string())
        } else if now < self.start_date {
            Some("coupon-not-yet-valid".to_string())
        } else if now > self.end_date {
            Some("coupon-expired".to_string())
        } else if total < self.min_purchase {
            Some(format!("coupon-min-purchase-not-met:{}", self.min_purchase))
        } else if self.max_uses.map_or(false, |m| self.uses_count >= m) {
            Some("coupon-usage-exhausted".to_string())
        } else {
            None
        };
        match reason {
            Some(r) => Err(AppError::new(AppErrorCode::InvalidState, r)),
            None => Ok(()),
        }
    }

    /// discount never exceeds the amount itself
    pub fn discount(&self, total: Decimal) -> Decimal {
        let amount = match self.discount_type {
            CouponDiscountType::Percentage => {
                total * self.discount_value / Decimal::ONE_HUNDRED
            }
            CouponDiscountType::FixedAmount => self.discount_value,
        };
        amount.min(total).max(Decimal::ZERO)
    }

    pub fn apply(
        &self,
        total: Decimal,
        now: DateTime<Utc>,
    ) -> DefaultResult<CouponDiscountApplied, AppError> {
        self.validate(total, now)?;
        let discount_amount = self.discount(total);
        Ok(CouponDiscountApplied {
            coupon_id: self.id,
            discount_amount,
            final_amount: total - discount_amount,
        })
    }
} // end of impl CouponModel
