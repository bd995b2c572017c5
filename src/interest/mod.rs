//! arrears interest and rescheduling
//!
//! Transactions carry flat interest fixed at creation; the only interest that
//! moves afterwards is the arrears surcharge added when an installment is
//! rescheduled.

pub mod penalty;
pub mod reschedule;

pub use penalty::{suggested_interest, ArrearsEngine, ArrearsSuggestion};
pub use reschedule::{reschedule, RescheduleOutcome, RescheduleRequest};
