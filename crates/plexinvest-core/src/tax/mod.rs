//! Progressive-bracket taxation and the Quebec property transfer duty
//! ("welcome tax") built on top of it.

pub mod brackets;
pub mod transfer;

pub use brackets::{bracket_breakdown, tax_owed, BracketSlice, BracketTable, TaxBracket};
pub use transfer::{
    calculate_transfer_tax, municipality_from_postal_code, taxable_base, transfer_tax,
    Municipality, Surcharge, TransferTaxInput, TransferTaxOutput, TransferTaxSchedule,
};
