pub mod animator;
pub mod app;
pub mod cli;
pub mod delay;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod presentation;
pub mod settings;
pub mod speedtest;
pub mod ui;
