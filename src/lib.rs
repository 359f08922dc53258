pub mod app;
pub mod assets;
pub mod cli;
pub mod commands;
pub mod configuration;
pub mod context;
pub mod db;
pub mod directory;
pub mod logging;
pub mod registry;
pub mod rest;
pub mod service;
pub mod types;
pub mod validation;
