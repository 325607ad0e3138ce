//! Domain logic for the membership plugin.
//!
//! The crate holds no persistence or rendering code: callers fetch records,
//! pass them in, and render whatever comes back.

pub mod badges;
pub mod error;
pub mod types;
