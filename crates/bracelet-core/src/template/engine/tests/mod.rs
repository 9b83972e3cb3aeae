//! Tests for template engine
//!
//! Organized into focused submodules, one per concern.

use super::*;



// Rendering tests
mod render_basic;
mod render_escaping;


mod timeouts;
