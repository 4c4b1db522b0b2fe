// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Blocks loaded verbatim from template fragments

use super::Block;
use super::BlockBody;
use super::BlockError;
use crate::context::GenContext;
use crate::isa::Extension;

/// The fixed parts of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CannedKind {
    /// Trap handler
    Trap,
    /// Return path shared by the correct and mispredicted flows
    FunctionEnd,
    Exit,
    PocFunc,
    Poc,
    /// Places the secret in memory
    InitSecret,
}

impl CannedKind {
    /// File stem of the fragments, e.g. `func_end` for `func_end.text.S`.
    pub fn stem(self) -> &'static str {
        match self {
            CannedKind::Trap => "trap",
            CannedKind::FunctionEnd => "func_end",
            CannedKind::Exit => "exit",
            CannedKind::PocFunc => "poc_func",
            CannedKind::Poc => "poc",
            CannedKind::InitSecret => "init_secret",
        }
    }

    /// The proof-of-concept fragments have no data part.
    pub fn has_data(self) -> bool {
        !matches!(self, CannedKind::PocFunc | CannedKind::Poc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedBlock {
    kind: CannedKind,
    body: BlockBody,
}

impl CannedBlock {
    /// Canned blocks only have a default mode, so `default` must be set.
    pub fn new(
        kind: CannedKind,
        name: impl Into<String>,
        extensions: impl IntoIterator<Item = Extension>,
        default: bool,
    ) -> Result<Self, BlockError> {
        Ok(Self {
            kind,
            body: BlockBody::default_only(name, extensions, default)?,
        })
    }

    pub fn kind(&self) -> CannedKind {
        self.kind
    }
}

impl Block for CannedBlock {
    fn body(&self) -> &BlockBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut BlockBody {
        &mut self.body
    }

    fn gen_default(&mut self, ctx: &mut GenContext) -> Result<(), BlockError> {
        let stem = self.kind.stem();
        self.body.instructions = ctx.templates.load(&format!("{stem}.text.S"))?;
        if self.kind.has_data() {
            self.body.data = ctx.templates.load(&format!("{stem}.data.S"))?;
        }
        Ok(())
    }
}
