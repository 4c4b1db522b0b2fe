// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Blocks of a transient-execution test case
//!
//! A block is a labelled piece of the final program: a sequence of instruction lines and a
//! sequence of data lines. Blocks come in two modes. Default blocks are canned, either loaded
//! from a template fragment or derived deterministically from other blocks. Random blocks are
//! synthesised through the [`GenContext`]'s instruction selector.
//!
//! Every block is generated exactly once through [`Block::gen_instr`] and only read afterwards.

pub mod canned;
pub mod delay;
pub mod predict;
pub mod train;
pub mod victim;

use std::collections::BTreeSet;
use std::path::PathBuf;

pub use canned::CannedBlock;
pub use canned::CannedKind;
pub use delay::DelayBlock;
pub use predict::PredictBlock;
pub use predict::PredictKind;
pub use train::ImmParams;
pub use train::TrainBlock;
pub use train::TriggerValue;
pub use victim::VictimBlock;

use crate::context::GenContext;
use crate::isa::AsmLine;
use crate::isa::Extension;
use crate::isa::Register;
use crate::isa::XRegister;
use crate::isa::instruction::FieldError;
use crate::selector::SelectionExhausted;

/// Errors raised while constructing or generating a block
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    #[error("Invalid configuration for block {block}: {reason}")]
    Configuration { block: String, reason: String },

    #[error(transparent)]
    SelectionExhausted(#[from] SelectionExhausted),

    #[error("Precondition violated by block {block}: {reason}")]
    PreconditionViolation { block: String, reason: String },

    #[error("Failed to read template {}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Field(#[from] FieldError),
}

impl BlockError {
    pub fn configuration(block: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            block: block.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn precondition(block: &str, reason: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            block: block.to_owned(),
            reason: reason.into(),
        }
    }
}

/// State shared by every kind of block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBody {
    /// Label of the block's code. Its data is labelled `<name>_data`.
    pub name: String,

    /// Extensions the block may draw instructions from
    pub extensions: BTreeSet<Extension>,

    /// Canned rather than synthesised
    pub default: bool,

    pub instructions: Vec<AsmLine>,
    pub data: Vec<AsmLine>,

    generated: bool,
}

impl BlockBody {
    pub fn new(
        name: impl Into<String>,
        extensions: impl IntoIterator<Item = Extension>,
        default: bool,
    ) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.into_iter().collect(),
            default,
            instructions: Vec::new(),
            data: Vec::new(),
            generated: false,
        }
    }

    /// Body of a block that only has a default mode.
    pub fn default_only(
        name: impl Into<String>,
        extensions: impl IntoIterator<Item = Extension>,
        default: bool,
    ) -> Result<Self, BlockError> {
        let body = Self::new(name, extensions, default);
        if !default {
            return Err(BlockError::precondition(
                &body.name,
                "block only supports the default mode",
            ));
        }
        Ok(body)
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }
}

/// A labelled unit of code and data in a test case
pub trait Block {
    fn body(&self) -> &BlockBody;

    fn body_mut(&mut self) -> &mut BlockBody;

    /// Populate the block in default mode.
    fn gen_default(&mut self, ctx: &mut GenContext) -> Result<(), BlockError>;

    /// Populate the block in random mode.
    fn gen_random(&mut self, _ctx: &mut GenContext) -> Result<(), BlockError> {
        Err(BlockError::configuration(
            self.name(),
            "random generation is not supported",
        ))
    }

    /// Populate the block according to its mode. A block can only be generated once.
    fn gen_instr(&mut self, ctx: &mut GenContext) -> Result<(), BlockError> {
        if self.body().generated {
            return Err(BlockError::precondition(self.name(), "already generated"));
        }

        if self.is_default() {
            self.gen_default(ctx)?;
        } else {
            self.gen_random(ctx)?;
        }

        let body = self.body_mut();
        body.generated = true;
        crate::log::debug!(
            block = body.name.as_str(),
            default = body.default,
            instructions = body.instructions.len(),
            data = body.data.len(),
            "Generated block"
        );
        Ok(())
    }

    /// Render the block as newline-terminated assembly lines: the code lines under `<name>:`
    /// and the data lines under `<name>_data:`.
    fn gen_asm(&self) -> (Vec<String>, Vec<String>) {
        let body = self.body();
        let render = |label: String, lines: &[AsmLine]| {
            std::iter::once(format!("{label}:\n"))
                .chain(lines.iter().map(|line| format!("{line}\n")))
                .collect::<Vec<_>>()
        };

        (
            render(body.name.clone(), &body.instructions),
            render(format!("{}_data", body.name), &body.data),
        )
    }

    fn name(&self) -> &str {
        &self.body().name
    }

    /// Does the block take part in the test case at all?
    fn work(&self) -> bool {
        !self.body().extensions.is_empty()
    }

    fn is_default(&self) -> bool {
        self.body().default
    }

    /// Registers the block may clobber. Canned code only uses the scratch registers `t0` and
    /// `t1`; synthesised code clobbers whatever its structured instructions write.
    fn need_store(&self) -> BTreeSet<Register> {
        let body = self.body();
        if body.default {
            return [XRegister::t0, XRegister::t1]
                .into_iter()
                .map(Register::from)
                .collect();
        }

        body.instructions
            .iter()
            .filter_map(AsmLine::as_instruction)
            .filter_map(|instr| instr.destination())
            .collect()
    }
}
