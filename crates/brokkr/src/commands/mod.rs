//! Command handlers

pub mod clone;
pub mod clones;
pub mod version;
