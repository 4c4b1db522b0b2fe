// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! The secret-accessing gadget reached on the mispredicted path

use super::Block;
use super::BlockBody;
use super::BlockError;
use crate::context::GenContext;
use crate::isa::AsmLine;
use crate::isa::Extension;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VictimBlock {
    body: BlockBody,
    return_block: String,
}

impl VictimBlock {
    /// Victim gadget which continues at `return_block` once it is done.
    pub fn new(
        name: impl Into<String>,
        extensions: impl IntoIterator<Item = Extension>,
        default: bool,
        return_block: impl Into<String>,
    ) -> Self {
        Self {
            body: BlockBody::new(name, extensions, default),
            return_block: return_block.into(),
        }
    }
}

impl Block for VictimBlock {
    fn body(&self) -> &BlockBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut BlockBody {
        &mut self.body
    }

    fn gen_default(&mut self, ctx: &mut GenContext) -> Result<(), BlockError> {
        self.body.instructions = ctx.templates.load("victim.text.S")?;
        self.body
            .instructions
            .push(AsmLine::raw(format!("j {}", self.return_block)));
        Ok(())
    }
}
