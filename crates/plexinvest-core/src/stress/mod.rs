//! Debt service coverage at the contract rate and at the regulatory
//! qualifying rate.

pub mod dscr;

pub use dscr::{dscr, evaluate, stress_test, StressEvaluation, StressTestInput};
