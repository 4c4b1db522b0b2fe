// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Whole test cases
//!
//! A [`TestCase`] owns one block of every kind. Blocks are generated in dependency order (the
//! predict block consumes the delay block's result, the train block consumes both) but laid out
//! in program order, so that the predict block falls through into the victim gadget and the
//! victim gadget is followed by the common function end.

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::blocks::Block;
use crate::blocks::BlockError;
use crate::blocks::CannedBlock;
use crate::blocks::CannedKind;
use crate::blocks::DelayBlock;
use crate::blocks::ImmParams;
use crate::blocks::PredictBlock;
use crate::blocks::TrainBlock;
use crate::blocks::VictimBlock;
use crate::blocks::predict::NOT_TAKEN_TARGET;
use crate::blocks::predict::TAKEN_TARGET;
use crate::blocks::train::DELAY_ENTRY;
use crate::blocks::train::PREDICT_ENTRY;
use crate::config::GeneratorConfig;
use crate::context::GenContext;
use crate::isa::Extension;
use crate::isa::Register;

/// Block where the victim run architecturally continues
const CORRECT_BLOCK: &str = TAKEN_TARGET;

/// Block the predictor is trained towards
const FALSE_BLOCK: &str = NOT_TAKEN_TARGET;

pub struct TestCase {
    seed: u64,
    blocks: Vec<Box<dyn Block>>,
}

impl TestCase {
    /// Generate every block of a test case described by `config`.
    pub fn generate(config: &GeneratorConfig, ctx: &mut GenContext) -> Result<Self, BlockError> {
        let seed = ctx.seed();
        if config.extensions.is_empty() {
            crate::log::warning!("No extensions configured, test case is empty");
            return Ok(Self {
                seed,
                blocks: Vec::new(),
            });
        }

        let extensions = || config.extensions.iter().copied();
        let canned = |kind: CannedKind| -> Result<Box<dyn Block>, BlockError> {
            Ok(Box::new(CannedBlock::new(kind, kind.stem(), extensions(), true)?))
        };

        let mut delay = DelayBlock::new(DELAY_ENTRY, extensions(), config.delay_default);
        generate(&mut delay, ctx)?;

        let mut predict = match delay.result() {
            Some(result) => PredictBlock::new(
                PREDICT_ENTRY,
                extensions(),
                true,
                result.register,
                result.imm,
                config.predict_kind.as_str(),
                CORRECT_BLOCK,
            ),
            None => {
                return Err(BlockError::precondition(
                    delay.name(),
                    "delay block produced no result",
                ));
            }
        };
        generate(&mut predict, ctx)?;

        let mut train = TrainBlock::new(
            "train",
            extensions(),
            true,
            config.train_loop,
            config.victim_loop,
            config.predict_kind.as_str(),
            CORRECT_BLOCK,
            FALSE_BLOCK,
            ImmParams::from_blocks(&delay, &predict)?,
        );
        generate(&mut train, ctx)?;

        let blocks: Vec<Box<dyn Block>> = vec![
            canned(CannedKind::InitSecret)?,
            Box::new(train),
            canned(CannedKind::Exit)?,
            Box::new(delay),
            Box::new(predict),
            Box::new(VictimBlock::new(
                FALSE_BLOCK,
                extensions(),
                true,
                CORRECT_BLOCK,
            )),
            canned(CannedKind::FunctionEnd)?,
            canned(CannedKind::PocFunc)?,
            canned(CannedKind::Poc)?,
            canned(CannedKind::Trap)?,
        ];

        let mut test_case = Self { seed, blocks };
        for block in test_case.blocks.iter_mut() {
            if !block.body().is_generated() {
                generate(block.as_mut(), ctx)?;
            }
        }

        crate::log::info!(
            seed,
            blocks = %test_case.blocks.iter().map(|block| block.name()).join(", "),
            "Generated test case"
        );
        Ok(test_case)
    }

    /// Seed of the context the test case was generated with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Blocks in program order
    pub fn blocks(&self) -> &[Box<dyn Block>] {
        &self.blocks
    }

    pub fn block(&self, name: &str) -> Option<&dyn Block> {
        self.blocks
            .iter()
            .find(|block| block.name() == name)
            .map(|block| block.as_ref())
    }

    /// Registers clobbered by any block of the test case.
    pub fn need_store(&self) -> BTreeSet<Register> {
        self.blocks
            .iter()
            .filter(|block| block.work())
            .flat_map(|block| block.need_store())
            .collect()
    }

    /// Extensions used by the test case.
    pub fn extensions(&self) -> BTreeSet<Extension> {
        self.blocks
            .iter()
            .flat_map(|block| block.body().extensions.iter().copied())
            .collect()
    }

    /// Assembly source: every block's code in a `.text` section, then every block's data in a
    /// `.data` section.
    pub fn render(&self) -> String {
        let mut text = vec![".text\n".to_owned()];
        let mut data = vec![".data\n".to_owned()];

        for block in self.blocks.iter().filter(|block| block.work()) {
            let (block_text, block_data) = block.gen_asm();
            text.extend(block_text);
            data.extend(block_data);
        }

        text.iter().chain(&data).join("")
    }
}

/// Generate `block` unless it does not take part in the test case.
fn generate(block: &mut dyn Block, ctx: &mut GenContext) -> Result<(), BlockError> {
    if !block.work() {
        crate::log::debug!(block = block.name(), "Skipping idle block");
        return Ok(());
    }
    block.gen_instr(ctx)
}
