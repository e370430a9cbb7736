//! Root containment and access policy.

pub mod containment;
pub mod policy;

// Re-export public types and functions
pub use containment::is_inside;
pub use policy::AccessMode;
pub use policy::AccessPolicy;
