pub mod app;
pub mod appearance;
pub mod chat;
pub mod config;
pub mod emotion;
pub mod error;
pub mod fx;
pub mod input;
pub mod pet;
pub mod render;
pub mod sentiment;
pub mod storage;
