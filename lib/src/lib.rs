// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Generator of RISC-V transient-execution test cases
//!
//! A test case trains a branch, call or return predictor with parameters that never reach the
//! secret, then runs the same code once with parameters that do. The predictor follows the
//! trained path while a chain of dependent instructions delays the real outcome, so the victim
//! gadget runs transiently on the secret.
//!
//! The crate only emits assembly text. Assembling, running and measuring the test case is left
//! to the surrounding tooling.

pub mod blocks;
pub mod config;
pub mod context;
pub mod isa;
mod log;
pub mod program;
pub mod selector;
pub mod templates;

pub use blocks::Block;
pub use blocks::BlockError;
pub use config::GeneratorConfig;
pub use context::GenContext;
pub use program::TestCase;
