//! API middleware stack.
//!
//! Execution order (outermost → innermost): CORS → audit logger → handler.

pub mod audit;
