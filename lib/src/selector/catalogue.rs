// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Rejection-sampling selector over the static mnemonic catalogue
//!
//! Candidates are the mnemonics whose category, extension, format and names can satisfy the
//! request. Each attempt picks a candidate, fills its fields randomly, then forces the fields
//! the request pins down. The result is only returned once every constraint holds.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use strum::IntoEnumIterator;

use super::Constraint;
use super::Constraints;
use super::InstructionSelector;
use super::SelectionExhausted;
use crate::isa::FRegister;
use crate::isa::Field;
use crate::isa::Instruction;
use crate::isa::Mnemonic;
use crate::isa::Operand;
use crate::isa::Register;
use crate::isa::XRegister;

/// Default number of candidate instantiations per request
pub const DEFAULT_ATTEMPTS: usize = 256;

/// Selector drawing from every [`Mnemonic`] the crate knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogueSelector {
    attempts: usize,
}

impl CatalogueSelector {
    /// Selector giving up after `attempts` failed instantiations.
    pub fn new(attempts: usize) -> Self {
        Self { attempts }
    }

    /// Mnemonics that could satisfy the request.
    pub fn candidates(constraints: &Constraints) -> Vec<Mnemonic> {
        Mnemonic::iter().filter(|m| constraints.admits(*m)).collect()
    }

    /// Build one randomised instance of `mnemonic` shaped by `constraints`.
    fn instantiate(
        rng: &mut StdRng,
        mnemonic: Mnemonic,
        constraints: &Constraints,
    ) -> Option<Instruction> {
        let mut instr = Instruction::blank(mnemonic);

        for &field in mnemonic.format().fields() {
            let value = match field {
                Field::Rd | Field::Rs1 | Field::Rs2 => Operand::from(random_x(rng)),
                Field::Frd | Field::Frs1 | Field::Frs2 | Field::Frs3 => {
                    Operand::from(random_f(rng))
                }
                Field::Imm => Operand::Imm(rng.random_range(constraints.imm_values(mnemonic)?)),
            };
            instr.set(field, value).ok()?;
        }

        if let Some(labels) = &constraints.labels {
            instr.set_target(labels.choose(rng)?.as_str()).ok()?;
        }

        // Restrict, then satisfy disjunctions, then force exact values, so that forced values
        // are never overwritten.
        for constraint in &constraints.fields {
            if let Constraint::Within { fields, values } = constraint {
                for &field in fields {
                    let Some(current) = instr.register(field) else {
                        continue;
                    };
                    let same_kind: Vec<Register> = values
                        .iter()
                        .copied()
                        .filter(|v| v.is_gpr() == current.is_gpr())
                        .collect();
                    if let Some(reg) = same_kind.choose(rng) {
                        instr.set(field, *reg).ok()?;
                    }
                }
            }
        }

        for constraint in &constraints.fields {
            if let Constraint::AnyEquals { fields, value } = constraint {
                let present: Vec<Field> = fields
                    .iter()
                    .copied()
                    .filter(|field| instr.has(*field))
                    .collect();
                if !present.iter().any(|field| instr.get(*field) == Some(*value)) {
                    let field = present.choose(rng)?;
                    instr.set(*field, *value).ok()?;
                }
            }
        }

        for constraint in &constraints.fields {
            if let Constraint::Equals { field, value } = constraint {
                instr.set(*field, *value).ok()?;
            }
        }

        constraints.holds(&instr).then_some(instr)
    }
}

impl Default for CatalogueSelector {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS)
    }
}

impl InstructionSelector for CatalogueSelector {
    fn select(
        &mut self,
        rng: &mut StdRng,
        constraints: &Constraints,
    ) -> Result<Instruction, SelectionExhausted> {
        let candidates = Self::candidates(constraints);
        let exhausted = |attempts| SelectionExhausted {
            constraints: Box::new(constraints.clone()),
            attempts,
        };

        if candidates.is_empty() {
            return Err(exhausted(0));
        }

        for _ in 0..self.attempts {
            let Some(&mnemonic) = candidates.choose(rng) else {
                break;
            };
            if let Some(instr) = Self::instantiate(rng, mnemonic, constraints) {
                return Ok(instr);
            }
        }

        Err(exhausted(self.attempts))
    }
}

fn random_x(rng: &mut StdRng) -> XRegister {
    let regs: Vec<XRegister> = XRegister::iter().collect();
    regs[rng.random_range(0..regs.len())]
}

fn random_f(rng: &mut StdRng) -> FRegister {
    let regs: Vec<FRegister> = FRegister::iter().collect();
    regs[rng.random_range(0..regs.len())]
}
