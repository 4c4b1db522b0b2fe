// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Instruction selection
//!
//! Blocks never construct randomised instructions themselves. They describe what they need as
//! [`Constraints`] and ask an [`InstructionSelector`] for a concrete [`Instruction`]. A selector
//! either answers or reports [`SelectionExhausted`]; it must never loop without bound.

mod catalogue;
mod constraints;

pub use catalogue::CatalogueSelector;
pub use catalogue::DEFAULT_ATTEMPTS;
pub use constraints::Constraint;
pub use constraints::Constraints;
use rand::rngs::StdRng;

use crate::isa::Instruction;

/// No instruction satisfying a request could be found
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No instruction satisfies {constraints} ({attempts} attempts)")]
pub struct SelectionExhausted {
    /// The request that could not be satisfied
    pub constraints: Box<Constraints>,

    /// Number of candidates tried before giving up
    pub attempts: usize,
}

/// Source of concrete instructions for a constraint request
pub trait InstructionSelector {
    /// Pick one instruction satisfying every part of `constraints`.
    fn select(
        &mut self,
        rng: &mut StdRng,
        constraints: &Constraints,
    ) -> Result<Instruction, SelectionExhausted>;
}

impl<S: InstructionSelector + ?Sized> InstructionSelector for &mut S {
    fn select(
        &mut self,
        rng: &mut StdRng,
        constraints: &Constraints,
    ) -> Result<Instruction, SelectionExhausted> {
        S::select(self, rng, constraints)
    }
}

impl<S: InstructionSelector + ?Sized> InstructionSelector for Box<S> {
    fn select(
        &mut self,
        rng: &mut StdRng,
        constraints: &Constraints,
    ) -> Result<Instruction, SelectionExhausted> {
        S::select(self, rng, constraints)
    }
}
