pub mod extractor;
pub mod html;
pub mod preview;
pub mod table;

pub use extractor::{ContentExtractor, ExtractedContent, ExtractedDocument, Extraction};
pub use html::strip_html_tags;
pub use preview::preview;
pub use table::{ColumnType, Table};
