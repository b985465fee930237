pub mod chat;
pub mod ticket;
