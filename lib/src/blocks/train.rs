// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Predictor training and the victim run
//!
//! The train block drives the test case. It first runs the predict block `train_loop` times with
//! the false trigger, which never leads to the secret, so that the predictor learns the false
//! outcome. It then runs the delay and predict blocks `victim_loop` times with the true trigger.
//! The predictor follows the trained outcome while the delay chain keeps the real one pending,
//! so the victim gadget executes transiently with the secret offset.
//!
//! Every run stores its resumption point in the `store_ra` cell and loads its parameters from a
//! table in the data section: three doublewords per training run (trigger, offset, delay value)
//! and two per victim run (trigger, offset).

use std::fmt;

use rand::Rng;
use rand::rngs::StdRng;

use super::Block;
use super::BlockBody;
use super::BlockError;
use super::DelayBlock;
use super::PredictBlock;
use super::PredictKind;
use crate::context::GenContext;
use crate::isa::AsmLine;
use crate::isa::Extension;
use crate::isa::Mnemonic;
use crate::isa::XRegister;
use crate::isa::registers::OFFSET_ARG;
use crate::isa::registers::TRIGGER_ARG;

/// Label of the predict block, entered by training runs
pub const PREDICT_ENTRY: &str = "predict";

/// Label of the delay block, entered by victim runs
pub const DELAY_ENTRY: &str = "delay";

pub const TRAIN_TABLE: &str = "train_param_table";
pub const VICTIM_TABLE: &str = "victim_param_table";

/// Memory cell holding the resumption point of the current run
pub const RETURN_CELL: &str = "store_ra";

/// Offset argument of the victim runs, pointing the victim gadget at the secret
pub const SECRET_OFFSET: &str = "secret + LEAK_TARGET - trapoline";

/// Doublewords per training table record
const TRAIN_RECORD: usize = 3;

/// Doublewords per victim table record
const VICTIM_RECORD: usize = 2;

/// A parameter table entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TriggerValue {
    Signed(i64),
    Unsigned(u64),
    /// Label arithmetic, resolved by the assembler
    Symbolic(String),
}

impl fmt::Display for TriggerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerValue::Signed(value) => value.fmt(f),
            TriggerValue::Unsigned(value) => value.fmt(f),
            TriggerValue::Symbolic(expr) => f.write_str(expr),
        }
    }
}

/// What the train block needs to know about the delay and predict blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImmParams {
    /// Immediate of the call or return, or the branch pivot
    pub predict: i64,

    /// Value the delay chain produces
    pub delay: i64,

    /// Register the delay chain leaves its value in
    pub delay_reg: XRegister,

    /// Opcode of the branch, for the branch kinds
    pub branch_kind: Option<Mnemonic>,
}

impl ImmParams {
    /// Collect the parameters from generated delay and predict blocks.
    pub fn from_blocks(delay: &DelayBlock, predict: &PredictBlock) -> Result<Self, BlockError> {
        let Some(result) = delay.result() else {
            return Err(BlockError::precondition(
                delay.name(),
                "delay block has not been generated",
            ));
        };
        if !predict.body().is_generated() {
            return Err(BlockError::precondition(
                predict.name(),
                "predict block has not been generated",
            ));
        }

        Ok(Self {
            predict: predict.imm(),
            delay: result.imm,
            delay_reg: result.register,
            branch_kind: predict.branch_kind(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainBlock {
    body: BlockBody,
    train_loop: usize,
    victim_loop: usize,
    predict_kind: String,
    correct_block: String,
    false_block: String,
    imm_params: ImmParams,
}

impl TrainBlock {
    #[expect(clippy::too_many_arguments, reason = "Mirrors the block's inputs one to one")]
    pub fn new(
        name: impl Into<String>,
        extensions: impl IntoIterator<Item = Extension>,
        default: bool,
        train_loop: usize,
        victim_loop: usize,
        predict_kind: impl Into<String>,
        correct_block: impl Into<String>,
        false_block: impl Into<String>,
        imm_params: ImmParams,
    ) -> Self {
        Self {
            body: BlockBody::new(name, extensions, default),
            train_loop,
            victim_loop,
            predict_kind: predict_kind.into(),
            correct_block: correct_block.into(),
            false_block: false_block.into(),
            imm_params,
        }
    }

    fn configuration(&self, reason: impl Into<String>) -> BlockError {
        BlockError::configuration(&self.body.name, reason)
    }

    /// Trigger values `(true, false)`. The false trigger makes the predict block go the trained
    /// way, the true trigger the other way.
    pub fn derive_trigger_params(
        &self,
        rng: &mut StdRng,
    ) -> Result<(TriggerValue, TriggerValue), BlockError> {
        let kind: PredictKind = self.predict_kind.parse().map_err(|_| {
            self.configuration(format!("unknown predict kind {:?}", self.predict_kind))
        })?;

        let params = &self.imm_params;
        let p = params.predict;

        if !kind.is_branch() {
            let false_trigger = format!("{} - {}", self.false_block, p);
            let true_trigger = format!("{} - {} - {}", self.correct_block, params.delay, p);
            return Ok((
                TriggerValue::Symbolic(true_trigger),
                TriggerValue::Symbolic(false_trigger),
            ));
        }

        let Some(branch) = params.branch_kind else {
            return Err(self.configuration("branch predict kind without a branch opcode"));
        };

        let signed_pivot = || {
            if p == i64::MIN || p == i64::MAX {
                return Err(self.configuration(format!("{branch} cannot pivot on {p}")));
            }
            Ok(p)
        };
        let unsigned_pivot = || {
            let u = p as u64;
            if u == 0 || u == u64::MAX {
                return Err(self.configuration(format!("{branch} cannot pivot on {u}")));
            }
            Ok(u)
        };
        let neighbour = if p == 0 { 1 } else { p.wrapping_sub(1) };

        let (true_trigger, false_trigger) = match branch {
            Mnemonic::Beq => (TriggerValue::Signed(p), TriggerValue::Signed(neighbour)),
            Mnemonic::Bne => (TriggerValue::Signed(neighbour), TriggerValue::Signed(p)),
            Mnemonic::Blt => {
                let p = signed_pivot()?;
                (
                    TriggerValue::Signed(rng.random_range(i64::MIN..=p - 1)),
                    TriggerValue::Signed(rng.random_range(p..=i64::MAX)),
                )
            }
            Mnemonic::Bge => {
                let p = signed_pivot()?;
                (
                    TriggerValue::Signed(rng.random_range(p..=i64::MAX)),
                    TriggerValue::Signed(rng.random_range(i64::MIN..=p - 1)),
                )
            }
            Mnemonic::Bltu => {
                let u = unsigned_pivot()?;
                (
                    TriggerValue::Unsigned(rng.random_range(0..=u - 1)),
                    TriggerValue::Unsigned(rng.random_range(u..=u64::MAX)),
                )
            }
            Mnemonic::Bgeu => {
                let u = unsigned_pivot()?;
                (
                    TriggerValue::Unsigned(rng.random_range(u..=u64::MAX)),
                    TriggerValue::Unsigned(rng.random_range(0..=u - 1)),
                )
            }
            mnemonic => return Err(self.configuration(format!("{mnemonic} is not a branch"))),
        };

        Ok(match kind {
            PredictKind::BranchNotTaken => (false_trigger, true_trigger),
            _ => (true_trigger, false_trigger),
        })
    }

    /// Data tables: `train_loop` records of the false parameters and the delay value, then
    /// `victim_loop` records of the true parameters.
    pub fn build_parameter_tables(
        &mut self,
        true_trigger: &TriggerValue,
        true_offset: &TriggerValue,
        false_trigger: &TriggerValue,
        false_offset: &TriggerValue,
    ) {
        let delay = self.imm_params.delay;
        let data = &mut self.body.data;

        data.push(AsmLine::raw(format!("{TRAIN_TABLE}:")));
        for i in 0..self.train_loop {
            data.extend([
                AsmLine::raw(format!("train_predict_param_{i}:")),
                AsmLine::raw(format!(".dword {false_trigger}")),
                AsmLine::raw(format!("train_offset_param_{i}:")),
                AsmLine::raw(format!(".dword {false_offset}")),
                AsmLine::raw(format!("train_delay_value_{i}:")),
                AsmLine::raw(format!(".dword {delay}")),
            ]);
        }

        data.push(AsmLine::raw(format!("{VICTIM_TABLE}:")));
        for i in 0..self.victim_loop {
            data.extend([
                AsmLine::raw(format!("victim_predict_param_{i}:")),
                AsmLine::raw(format!(".dword {true_trigger}")),
                AsmLine::raw(format!("victim_offset_param_{i}:")),
                AsmLine::raw(format!(".dword {true_offset}")),
            ]);
        }
    }

    /// Training runs entering the predict block, then victim runs entering the delay block.
    pub fn emit_control_flow(&mut self) {
        let delay_reg = self.imm_params.delay_reg;
        let code = &mut self.body.instructions;

        let mut run = |resume: String, table: &str, offset: usize, delay_load: bool, entry: &str| {
            code.extend([
                AsmLine::raw(format!("la t0, {resume}")),
                AsmLine::raw(format!("la t1, {RETURN_CELL}")),
                AsmLine::raw("sd t0, 0(t1)"),
                AsmLine::raw(format!("la t0, {table}")),
                AsmLine::raw(format!("ld {TRIGGER_ARG}, {offset}(t0)")),
                AsmLine::raw(format!("ld {OFFSET_ARG}, {}(t0)", offset + 8)),
            ]);
            if delay_load {
                code.push(AsmLine::raw(format!("ld {delay_reg}, {}(t0)", offset + 16)));
            }
            code.extend([
                AsmLine::raw("INFO_VCTM_START"),
                AsmLine::raw(format!("j {entry}")),
                AsmLine::raw(format!("{resume}:")),
                AsmLine::raw("INFO_VCTM_END"),
            ]);
        };

        for i in 0..self.train_loop {
            run(
                format!("train_{i}_end"),
                TRAIN_TABLE,
                i * 8 * TRAIN_RECORD,
                true,
                PREDICT_ENTRY,
            );
        }
        for i in 0..self.victim_loop {
            run(
                format!("victim_{i}_end"),
                VICTIM_TABLE,
                i * 8 * VICTIM_RECORD,
                false,
                DELAY_ENTRY,
            );
        }
    }
}

impl Block for TrainBlock {
    fn body(&self) -> &BlockBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut BlockBody {
        &mut self.body
    }

    fn gen_default(&mut self, ctx: &mut GenContext) -> Result<(), BlockError> {
        let (true_trigger, false_trigger) = self.derive_trigger_params(&mut ctx.rng)?;
        crate::log::debug!(%true_trigger, %false_trigger, "Trigger parameters");

        let true_offset = TriggerValue::Symbolic(SECRET_OFFSET.to_owned());
        let false_offset = TriggerValue::Signed(0);
        self.build_parameter_tables(&true_trigger, &true_offset, &false_trigger, &false_offset);
        self.emit_control_flow();
        Ok(())
    }
}
