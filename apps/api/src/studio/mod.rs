// Prompt studio: document model, deterministic compiler, lint rules and the
// preset fragment library. Everything here is synchronous and side-effect free.

pub mod compiler;
pub mod document;
pub mod handlers;
pub mod library;
pub mod lint;
