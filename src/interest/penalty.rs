use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ArrearsConfig;
use crate::decimal::{Money, Rate};

/// engine for the advisory arrears-interest figure offered on a reschedule
pub struct ArrearsEngine {
    pub config: ArrearsConfig,
}

impl ArrearsEngine {
    pub fn new(config: ArrearsConfig) -> Self {
        Self { config }
    }

    /// `rate_per_block` of the base for every started block of overdue days
    ///
    /// `days_until` follows the calendar convention: negative means overdue.
    /// Installments that are not overdue get no suggestion.
    pub fn suggest(&self, base_amount: Money, days_until: i64) -> ArrearsSuggestion {
        if days_until >= 0 {
            return ArrearsSuggestion {
                interest: Money::ZERO,
                days_overdue: 0,
                blocks_charged: 0,
                rate_per_block: self.config.rate_per_block,
                base_amount,
            };
        }

        let days_overdue = days_until.unsigned_abs() as u32;
        let blocks_charged = days_overdue.div_ceil(self.config.block_days.max(1));
        let interest = base_amount
            * (self.config.rate_per_block.as_decimal() * Decimal::from(blocks_charged));

        ArrearsSuggestion {
            interest,
            days_overdue,
            blocks_charged,
            rate_per_block: self.config.rate_per_block,
            base_amount,
        }
    }

    /// suggestion rounded to the currency scale
    pub fn suggest_rounded(&self, base_amount: Money, days_until: i64, currency_decimals: u32) -> Money {
        self.suggest(base_amount, days_until)
            .interest
            .round_currency(currency_decimals)
    }
}

/// suggested arrears interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrearsSuggestion {
    pub interest: Money,
    pub days_overdue: u32,
    pub blocks_charged: u32,
    pub rate_per_block: Rate,
    pub base_amount: Money,
}

/// shorthand for [`ArrearsEngine::suggest`]
pub fn suggested_interest(base_amount: Money, days_until: i64, config: &ArrearsConfig) -> Money {
    ArrearsEngine::new(config.clone())
        .suggest(base_amount, days_until)
        .interest
}
