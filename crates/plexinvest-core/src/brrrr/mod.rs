//! Buy, Rehab, Rent, Refinance, Repeat.
//!
//! [`run_brrrr`] threads a [`PropertyFinancials`] snapshot through the five
//! phases in fixed order, then builds the cash waterfall and the scored
//! verdict. [`quick_metrics`] is a rule-of-thumb screen for comparing many
//! listings before a full run.

pub mod input;
pub mod phases;
pub mod pipeline;
pub mod quick;
pub mod verdict;
pub mod waterfall;

pub use input::{
    ExpenseItem, ExtractedProperty, OperatingExpenses, PropertyFinancials, RefinanceTerms,
    RenoFinancing, RenovationPlan, RentalUnit, MAX_AMOUNT, MAX_RENOVATION_MONTHS,
};
pub use phases::{
    AcquisitionPhase, CashOnCash, ExpenseBreakdown, RefinancePhase, RehabPhase, RentPhase,
    RepeatPhase,
};
pub use pipeline::{run_brrrr, BrrrrAnalysis, Kpis, Validation};
pub use quick::{quick_analysis, quick_metrics, QuickInput, QuickMetrics};
pub use verdict::{explain, grade_for, score, verdict, Grade, Verdict, VerdictInputs};
pub use waterfall::{Waterfall, WaterfallStep};
