//! Domain logic - pure release rules independent of git operations

pub mod branch;

pub use branch::BranchPatterns;
