//! Compiled backend: each fixture is translated to native source, linked
//! with its companion sink and the runtime archive, then run as a child
//! process. One process invocation handles one fixture.

pub mod codegen;
pub mod flags;
pub mod host;

pub use codegen::{companion_unit, generate_suite, Flavor};
pub use flags::{ToolchainFlags, GATES};
pub use host::{
    dispatch, run_fixture, CcToolchain, CommandTranslator, Dispatch, RunOutcome, Scratch,
    Selector, Stage, Toolchain, Translator,
};

#[cfg(test)]
mod tests;
