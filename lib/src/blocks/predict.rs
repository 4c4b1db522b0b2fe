// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! The prediction mechanism under attack
//!
//! The predict block consumes the delay chain's result and transfers control depending on the
//! trigger argument in `a0`. Which predictor is exercised depends on the [`PredictKind`]:
//! - `call` and `return` compute an indirect target `result + a0` and jump through `jalr`, which
//!   trains the indirect-jump and return-address predictors,
//! - `branch_taken` and `branch_not_taken` compare `a0` against the result with a conditional
//!   branch to `func_end` or `victim` respectively.
//!
//! The immediate and branch opcode chosen here are recorded, since the train block derives its
//! trigger values from them.

use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use super::Block;
use super::BlockBody;
use super::BlockError;
use crate::context::GenContext;
use crate::isa::AsmLine;
use crate::isa::Category;
use crate::isa::Extension;
use crate::isa::Field;
use crate::isa::Instruction;
use crate::isa::Mnemonic;
use crate::isa::XRegister;
use crate::isa::registers::TRIGGER_ARG;
use crate::selector::Constraint;
use crate::selector::Constraints;

/// Branch target when the branch is trained taken
pub const TAKEN_TARGET: &str = "func_end";

/// Branch target when the branch is trained not taken
pub const NOT_TAKEN_TARGET: &str = "victim";

/// Predictor mechanism exercised by a test case
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PredictKind {
    Call,
    Return,
    BranchTaken,
    BranchNotTaken,
}

impl PredictKind {
    pub fn is_branch(self) -> bool {
        matches!(self, PredictKind::BranchTaken | PredictKind::BranchNotTaken)
    }
}

/// Branch opcodes which cannot be triggered both ways when compared against `pivot`.
///
/// A signed comparison needs room on both sides of the pivot within the signed range, an
/// unsigned one within the unsigned range.
pub fn unsafe_branches(pivot: i64) -> Vec<Mnemonic> {
    let mut excluded = Vec::new();
    if pivot == i64::MIN || pivot == i64::MAX {
        excluded.extend([Mnemonic::Blt, Mnemonic::Bge]);
    }
    if pivot as u64 == 0 || pivot as u64 == u64::MAX {
        excluded.extend([Mnemonic::Bltu, Mnemonic::Bgeu]);
    }
    excluded
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictBlock {
    body: BlockBody,
    result_reg: XRegister,
    result_imm: i64,
    predict_kind: String,
    correct_block: String,
    imm: i64,
    branch_kind: Option<Mnemonic>,
}

impl PredictBlock {
    /// `predict_kind` is checked when the block is generated.
    pub fn new(
        name: impl Into<String>,
        extensions: impl IntoIterator<Item = Extension>,
        default: bool,
        result_reg: XRegister,
        result_imm: i64,
        predict_kind: impl Into<String>,
        correct_block: impl Into<String>,
    ) -> Self {
        Self {
            body: BlockBody::new(name, extensions, default),
            result_reg,
            result_imm,
            predict_kind: predict_kind.into(),
            correct_block: correct_block.into(),
            imm: 0,
            branch_kind: None,
        }
    }

    /// Immediate resolved by the call or return, or the branch comparison pivot.
    pub fn imm(&self) -> i64 {
        self.imm
    }

    /// Opcode of the branch, for the branch kinds.
    pub fn branch_kind(&self) -> Option<Mnemonic> {
        self.branch_kind
    }

    pub fn predict_kind(&self) -> &str {
        &self.predict_kind
    }

    /// Block the victim run architecturally continues at.
    pub fn correct_block(&self) -> &str {
        &self.correct_block
    }

    fn jalr(
        ctx: &mut GenContext,
        rd: XRegister,
        rs1: XRegister,
        imm_zero: bool,
    ) -> Result<Instruction, BlockError> {
        let mut request = Constraints::new([Extension::RV_I])
            .categories([Category::Jump])
            .names([Mnemonic::Jalr])
            .with(Constraint::equals(Field::Rd, rd))
            .with(Constraint::equals(Field::Rs1, rs1));
        if imm_zero {
            request = request.imm_range(0..=0);
        }
        ctx.select(&request)
    }
}

impl Block for PredictBlock {
    fn body(&self) -> &BlockBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut BlockBody {
        &mut self.body
    }

    fn gen_default(&mut self, ctx: &mut GenContext) -> Result<(), BlockError> {
        let result = self.result_reg;
        self.body
            .instructions
            .push(Instruction::r_type(Mnemonic::Xor, result, result, result).into());

        let kind = PredictKind::from_str(&self.predict_kind).map_err(|_| {
            BlockError::configuration(
                &self.body.name,
                format!("unknown predict kind {:?}", self.predict_kind),
            )
        })?;

        let lines: Vec<AsmLine> = match kind {
            PredictKind::Call => {
                let link =
                    Instruction::r_type(Mnemonic::Add, XRegister::t0, result, TRIGGER_ARG);
                let call = Self::jalr(ctx, XRegister::ra, XRegister::t0, false)?;
                self.imm = call.imm().unwrap_or_default();
                vec![link.into(), call.into()]
            }

            PredictKind::Return => {
                let link =
                    Instruction::r_type(Mnemonic::Add, XRegister::ra, result, TRIGGER_ARG);
                let ret = Self::jalr(ctx, XRegister::zero, XRegister::ra, true)?;
                self.imm = ret.imm().unwrap_or_default();
                vec![link.into(), ret.into()]
            }

            PredictKind::BranchTaken | PredictKind::BranchNotTaken => {
                let target = if kind == PredictKind::BranchTaken {
                    TAKEN_TARGET
                } else {
                    NOT_TAKEN_TARGET
                };
                // The branch compares the trigger against the delay result, so the pivot is the
                // delay block's result immediate, recorded as this block's immediate.
                let pivot = self.result_imm;
                let request = Constraints::new([Extension::RV_I])
                    .categories([Category::Branch])
                    .labels([target])
                    .with(Constraint::equals(Field::Rs1, TRIGGER_ARG))
                    .with(Constraint::equals(Field::Rs2, result))
                    .with(Constraint::name_not_in(unsafe_branches(pivot)));
                let branch = ctx.select(&request)?;

                self.imm = pivot;
                self.branch_kind = Some(branch.mnemonic);
                vec![branch.into()]
            }
        };

        crate::log::debug!(
            kind = %kind,
            imm = self.imm,
            branch = ?self.branch_kind,
            "Predict mechanism"
        );

        self.body.instructions.extend(lines);
        Ok(())
    }
}
