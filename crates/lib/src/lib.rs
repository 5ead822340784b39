//! Nexora core library — persona config, guard checks, reply resolution,
//! typing reveal, and chat persistence shared by the CLI.

pub mod agent;
pub mod auth;
pub mod cancel;
pub mod config;
pub mod conversation;
pub mod guard;
pub mod llm;
pub mod notify;
pub mod persona;
pub mod resolver;
pub mod store;
pub mod typing;
