//! CLI command implementations.

pub mod check;
pub mod lookup;

pub use check::CheckCommand;
pub use lookup::LookupCommand;
