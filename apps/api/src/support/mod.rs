// Guideline Calculator: deterministic child-support estimate from income and timeshare.
// Pure functions only. Callers must run `validate` before trusting `compute`.

pub mod calculator;
pub mod handlers;
pub mod tax;

pub use calculator::{compute, validate, Party, PartyIncome, SupportInputs, SupportResult};
