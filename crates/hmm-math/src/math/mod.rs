//! Core math modules.

pub mod distribution;
pub mod error;
mod index;
pub mod stable;
pub mod table;
