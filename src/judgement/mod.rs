pub mod context;
pub mod error;
pub mod parser;
pub mod render;
pub mod token;
pub mod tokenizer;
pub mod tree;
pub mod typecheck;

pub use context::Context;
pub use error::{JudgementError, LexError, SyntaxError, TypeError};
pub use parser::Parser;
pub use token::{NodeKind, Token};
pub use tokenizer::Tokenizer;
pub use tree::{Node, Tree};
pub use typecheck::{check_judgement, infer_type, Verdict};
