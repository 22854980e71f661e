// src/lib.rs

pub mod api;
pub mod app;
pub mod chat_message;
pub mod chat_view;
pub mod cli;
pub mod config;
pub mod constants;
pub mod controller;
pub mod decoder;
pub mod errors;
pub mod key_handlers;
pub mod logging;
pub mod message_list;
pub mod models;
pub mod plain_view;
pub mod status_indicator;
