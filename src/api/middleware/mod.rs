//! API middleware stack.
//!
//! Execution order on protected routes (outermost → innermost):
//! 1. Auth validator (bearer token → session)
//! 2. Audit logger (logs after auth, has the username)

pub mod audit;
pub mod auth;
