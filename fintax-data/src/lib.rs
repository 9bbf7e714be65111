pub mod bracket_loader;
pub mod entry_loader;

pub use bracket_loader::{
    ProgressiveBracketLoader, ProgressiveBracketLoaderError, ProgressiveBracketRecord,
};
pub use entry_loader::{EntryCsvError, ImportedEntries};
