//! Support chat: keyword knowledge base, dialogue state machine, session
//! orchestration and the HTTP handlers in front of it.
//! The engine is pure; all waiting and ticket I/O happens in the service.

pub mod engine;
pub mod handlers;
pub mod knowledge;
pub mod service;
pub mod validation;
