//! Blueprint Core
//!
//! Core library for generating resource configuration templates from provider schemas

pub mod addrs;
pub mod config;
pub mod diagnostics;
pub mod formatter;
pub mod render;
pub mod resolver;
pub mod schema;
pub mod value;
