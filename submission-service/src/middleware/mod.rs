//! Request extractors for submission-service.

pub mod caller;

pub use caller::CallerContext;
