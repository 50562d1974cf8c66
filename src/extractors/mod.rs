pub mod esg_extractor;
pub mod fundamentals_normalizer;

pub use esg_extractor::{extract_esg_score, EsgExtractError, ESG_MARKER};
pub use fundamentals_normalizer::normalize_fundamentals;
