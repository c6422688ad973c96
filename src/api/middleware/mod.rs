//! API middleware stack.
//!
//! Execution order on the medicine routes (outermost → innermost):
//! 1. Auth validator: bearer token → `CallerContext`
//! 2. Audit logger: logs after auth, has the user id

pub mod audit;
pub mod auth;
