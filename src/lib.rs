// src/lib.rs

pub mod api;
pub mod app;
pub mod chat_message;
pub mod config;
pub mod constants;
pub mod context;
pub mod conversation;
pub mod errors;
pub mod key_handlers;
pub mod logging;
pub mod models;
pub mod status_indicator;
pub mod ui;

pub use api::{GeminiService, GeminiSession, ModelService};
pub use chat_message::{ChatMessage, Role};
pub use config::Config;
pub use context::{ContextLoader, ContextSource, SystemInstruction};
pub use conversation::{ControllerState, Conversation, ConversationView, SendOutcome};
pub use errors::{ConsejeroError, ConsejeroResult};
