//! Logical query model and compilation.

mod compiler;
mod error;
mod literal;
mod token;

pub use compiler::{QueryCompiler, ROOT_ALIAS};
pub use error::CompileError;
pub use literal::{parse_literal, ParsedLiteral};
pub use token::{CompiledQuery, ExecutableQuery, LogicalItemKind, LogicalQueryItem};
