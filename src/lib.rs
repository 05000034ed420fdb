pub mod config;
pub mod gemini;
pub mod http_client;
pub mod model;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod service;
pub mod state;
