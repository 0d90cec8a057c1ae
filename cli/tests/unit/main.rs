//! Unit tests for the deskpilot CLI
//!
//! These tests use mocked ports and run fast without any remote I/O.

mod discovery_service;
mod install_service;
mod status_service;
