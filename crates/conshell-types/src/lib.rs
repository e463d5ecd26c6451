//! Foundation types for conshell.
//!
//! This crate contains the rendering-agnostic types shared by the console
//! engine and its front ends: surface events, output styles, configuration,
//! and error types.

pub mod config;
pub mod error;
pub mod input;
