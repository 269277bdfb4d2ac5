//! Canadian mortgage mathematics.
//!
//! Fixed-rate mortgages in Canada quote a nominal annual rate compounded
//! semi-annually, while payments are monthly. Every payment figure in the
//! engine goes through [`rates::effective_monthly_rate`].

pub mod analysis;
pub mod payment;
pub mod rates;
pub mod schedule;

pub use analysis::{analyze_mortgage, MortgageAnalysis, MortgageInput};
pub use payment::{
    interest_only_payment, max_mortgage_from_dscr, max_principal_for_payment, monthly_payment,
    MAX_AMORTIZATION_YEARS,
};
pub use rates::{effective_monthly_rate, stress_test_rate};
pub use schedule::{
    amortization_schedule, remaining_balance, schedule_summary, AmortizationRow, ScheduleSummary,
};
