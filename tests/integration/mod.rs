//! Integration tests for modsync
//!
//! Each test builds a real git registry and a workspace in temporary
//! directories, then drives the library or the compiled binary.

mod helpers;

mod test_cli;
mod test_manifest;
mod test_reconcile;
mod test_update;
