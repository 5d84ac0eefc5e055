pub mod builder;
pub mod extract;
pub mod scanner;

pub use builder::MarkdownBuilder;
pub use extract::MetadataExtractor;
pub use scanner::{SectionKey, scan};
