//! # Exhibit Expressions - Abstract Syntax Tree
//!
//! Expressions are the small query language page authors embed in view and
//! facet configuration to pull values out of the item database.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the scanner
//! - **[expressions]** - Expression nodes (constants, paths, operators, calls)
//! - **[operators]** - Binary operator symbols and their precedence
//!
//! ## Quick Start
//!
//! ```text
//! .author.label
//! ```
//!
//! Starting from the current item (the `value` root), follow the `author`
//! property and then the `label` property of each author.
//!
//! ## Core Concepts
//!
//! ### Paths
//!
//! A path is a chain of hops through the database, optionally starting from
//! a named root:
//!
//! - `.prop` follows `prop` forward (subject to objects)
//! - `!prop` follows `prop` backward (object to subjects)
//! - `.@prop` / `!@prop` keep every visited value in order, duplicates
//!   included, instead of building a set
//! - `index.year` starts from the root named `index` instead of the default
//!
//! ### Calls
//!
//! `name(arg, ...)` calls a function when `name` is not a control. Function
//! arguments are evaluated before the call. Controls (`if`, `foreach`,
//! `default`, `filter`) receive their arguments unevaluated and decide what
//! to evaluate.
//!
//! ### Operators
//!
//! `* /` bind tighter than `+ -`, which bind tighter than the comparisons
//! `= <> < <= > >=`. All are left associative and apply to every pair of
//! values from their two operands.
//!
//! ## Examples
//!
//! ```text
//! count(!author)
//! if(exists(.cover), .cover, "no-cover.png")
//! foreach(.child, .age * 12)
//! concat(.firstName, " ", .lastName)
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, HopOperator, Path, Segment};
pub use tokens::{Token, TokenKind};
