mod accrual;
mod extractor;
mod value_objects;


pub use accrual::{AccrualEngine, AccrualKind};
pub use extractor::CountExtractor;
pub use value_objects::{ExtractionResult, ReportVocabulary};
