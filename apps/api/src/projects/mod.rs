// Saved prompt documents, scoped to an opaque session id.

pub mod handlers;
pub mod store;
