//! Care Companion — conversational program recommendation for elder care.

pub mod api;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod personality;
pub mod recommend;
pub mod store;
