pub mod analyze;
pub mod financing;
pub mod mortgage;
pub mod rules;
pub mod tax;
