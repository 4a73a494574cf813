// =============================================================================
// SHARED FOUNDATION MODULE ORGANIZATION - shared/src/types/mod.rs
// Type organization for the payload build tools
// =============================================================================

//! Type definitions shared by the payload build tools
//!
//! These types define the contracts between the command-line front door,
//! the target registry and the compilation pipeline: what a target looks
//! like, what a compilation request carries, how an external tool exited,
//! and how a build fails.

// Re-export all type categories for easy access
pub use self::error::*;
pub use self::request::*;
pub use self::target::*;
pub use self::tool::*;

// Module declarations for type categories
pub mod error;
pub mod request;
pub mod target;
pub mod tool;
