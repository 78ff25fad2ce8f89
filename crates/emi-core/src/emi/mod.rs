pub mod engine;
pub mod format;

#[cfg(feature = "session")]
pub mod session;

pub use engine::{
    compute_down_payment, compute_down_payment_with, compute_emi, compute_emi_with, emi_range,
    quote_emi, solve_down_payment, total_down_payment, total_repayment,
};
