//! Parser module for Rockstar.

mod core;
mod expressions;
mod precedence;
mod statements;

#[cfg(test)]
mod tests;

pub use self::core::{ParseResult, Parser};
