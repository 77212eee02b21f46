//! Agent result types

pub mod result;

pub use result::AgentResult;
