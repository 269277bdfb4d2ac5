//! CMHC-style mortgage default insurance: eligibility gating, premium grid
//! lookup, amortization surcharge and the provincial tax on the premium.

pub mod premium;

pub use premium::{
    assess, assess_insurance, minimum_down_payment, premium, Ineligible, InsuranceAssessment,
    InsuranceOutcome, InsuranceRequest, PremiumQuote,
};
