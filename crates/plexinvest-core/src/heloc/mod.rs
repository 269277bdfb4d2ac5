//! Borrowing capacity against a property, split at the two LTV ceilings
//! into a rotating (interest-only) band and an amortized band.

pub mod capacity;

pub use capacity::{
    capacity, heloc_capacity, optimal_refinance_structure, Capacity, HelocCapacityInput,
    RefinanceStructure,
};
