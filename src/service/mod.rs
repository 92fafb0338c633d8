//! Service layer containing business logic orchestration.

mod adapter;
mod filter_service;

pub use adapter::{format_listing, DocumentAdapter};
pub use filter_service::{FilterService, Invocation, InvocationOptions};
