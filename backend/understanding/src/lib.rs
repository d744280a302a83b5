pub mod enrichment;
pub mod ocr;
pub mod prompt;
pub mod vision;

pub use enrichment::{EnrichmentOutcome, HeaderEnricher};
pub use ocr::{TextractProvider, parse_error};
pub use prompt::build_header_prompt;
pub use vision::{DEFAULT_BASE_URL, OpenAiVisionProvider};
