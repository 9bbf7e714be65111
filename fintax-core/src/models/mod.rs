mod entry_error;
mod financial_entry;
mod other_entry;
mod tax_breakdown;
mod tax_policy;

pub use entry_error::EntryError;
pub use financial_entry::{FinancialEntry, FinancialEntryRecord, IncomeKind};
pub use other_entry::{OtherEntry, OtherEntryRecord};
pub use tax_breakdown::{TaxBreakdown, TaxMethod};
pub use tax_policy::{
    BracketGap, COMPREHENSIVE_SURCHARGE_RATE, DEFAULT_TAX_YEAR, FLAT_WITHHOLDING_RATE,
    PolicyError, ProgressiveBracket, THRESHOLD, TaxPolicy, default_brackets,
};
