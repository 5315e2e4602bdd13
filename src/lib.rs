//! Verification-suite generator for a language runtime with an
//! interpreter and an ahead-of-time compiler.
//!
//! Fixtures pair a program with the values it must emit. From one fixture
//! set the crate renders an interpreted suite that runs every fixture in a
//! single process and a compiled suite that runs one fixture per process.

pub mod assertion;
pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod fixture;
pub mod runtime;

#[cfg(test)]
mod tests;
