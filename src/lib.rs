//! In-memory chat core: conversations, reactions, reply drafts and emoji
//! recency, behind a pluggable transport.

pub mod bus;
pub mod chat;
pub mod config;
pub mod emoji;
pub mod entity;
pub mod error;
pub mod fixtures;
pub mod interface;
pub mod manager;
pub mod reaction;
