pub mod ast;
pub mod collection;
pub mod controls;
pub mod database;
pub mod evaluator;
pub mod expression;
pub mod format;
pub mod functions;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod registry;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Expr, HopOperator, Path, Segment, Token, TokenKind};
pub use collection::{Collection, ValueSet};
pub use database::{Database, DatabaseError, MemoryDatabase};
pub use evaluator::{EvalContext, EvalError, EvalResult, Roots, VALUE_ROOT};
pub use expression::{EvaluationResult, Expression, SingleResult};
pub use lexer::{LexError, Scanner, tokenize};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parsed, Parser, parse_expression, parse_expression_at, parse_several_at};
pub use registry::{Control, Function, OperatorDef, Registry, RegistryError};
pub use value::{Value, ValueType};
