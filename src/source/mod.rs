pub mod annotator;
pub mod span;

pub use annotator::SourceAnnotator;
pub use span::{Span, Spanned};
