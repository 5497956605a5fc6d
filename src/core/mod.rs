// Core modules implementing the token model, lexing, limit scanning, and error modeling.
pub mod error;
pub mod lexer;
pub mod limits;
pub mod scan;
pub mod token;
