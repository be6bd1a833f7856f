//! Shared services.
//!
//! File handling used by the tools that is not specific to one of them.

pub mod backup;
