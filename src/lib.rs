pub mod ast;
pub mod lexer;
pub mod parser;
pub mod value;
pub mod interpreter;
pub mod changes;
