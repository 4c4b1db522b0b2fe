// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Delay chains
//!
//! The delay block widens the transient window. It computes the predict block's input through a
//! chain of dependent registers, each step an instruction reading the previous register of the
//! chain and writing the next one, so that the branch, call or return it feeds cannot resolve
//! before the whole chain has executed.
//!
//! A synthesised block is laid out as:
//! 1. one initialiser per register read before the chain defines it, floating-point registers
//!    first because they are initialised through the scratch register `t0`,
//! 2. [`NOP_SLED`] `nop`s,
//! 3. the connecting instructions, in chain order.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

#[cfg(feature = "log")]
use itertools::Itertools;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use super::Block;
use super::BlockBody;
use super::BlockError;
use crate::context::GenContext;
use crate::isa::AsmLine;
use crate::isa::Category;
use crate::isa::Extension;
use crate::isa::FRegister;
use crate::isa::Field;
use crate::isa::Instruction;
use crate::isa::Register;
use crate::isa::XRegister;
use crate::isa::registers::fpr_pool;
use crate::isa::registers::gpr_pool;
use crate::selector::Constraint;
use crate::selector::Constraints;

/// Number of freely drawn chain registers. One more integer register always closes the chain.
pub const CHAIN_LINKS: RangeInclusive<usize> = 6..=8;

/// Chance of a freely drawn chain register being floating-point
pub const FLOAT_PROBABILITY: f64 = 0.2;

/// Number of `nop`s between the initialisers and the chain
pub const NOP_SLED: usize = 16;

/// Extensions providing float-to-float links
const FLOAT_LINK_EXTENSIONS: [Extension; 2] = [Extension::RV_F, Extension::RV_D];

/// Scratch register used to initialise floating-point registers
const SCRATCH: XRegister = XRegister::t0;

/// Where the delay block leaves its result for the predict block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayResult {
    pub register: XRegister,
    pub imm: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayBlock {
    body: BlockBody,
    chain: Vec<Register>,
    result: Option<DelayResult>,
}

impl DelayBlock {
    pub fn new(
        name: impl Into<String>,
        extensions: impl IntoIterator<Item = Extension>,
        default: bool,
    ) -> Self {
        Self {
            body: BlockBody::new(name, extensions, default),
            chain: Vec::new(),
            result: None,
        }
    }

    /// Registers of the dependency chain. Empty for canned delay blocks.
    pub fn chain(&self) -> &[Register] {
        &self.chain
    }

    /// Available once the block has been generated.
    pub fn result(&self) -> Option<DelayResult> {
        self.result
    }

    pub fn result_reg(&self) -> Option<XRegister> {
        self.result.map(|result| result.register)
    }

    pub fn result_imm(&self) -> Option<i64> {
        self.result.map(|result| result.imm)
    }

    /// Can the chain pass through floating-point registers? Entering and leaving the float file
    /// uses the `RV64_F` conversions, and float-to-float links need the `RV_F` or `RV_D`
    /// arithmetic.
    fn float_capable(&self) -> bool {
        let extensions = &self.body.extensions;
        extensions.contains(&Extension::RV64_F)
            && FLOAT_LINK_EXTENSIONS
                .iter()
                .any(|ext| extensions.contains(ext))
    }

    fn gen_chain(&self, rng: &mut StdRng) -> Vec<Register> {
        let gprs = gpr_pool();
        let fprs = fpr_pool();
        let float_capable = self.float_capable();

        let pick_gpr = |rng: &mut StdRng| gprs[rng.random_range(0..gprs.len())];

        let links = rng.random_range(CHAIN_LINKS);
        let mut chain: Vec<Register> = Vec::with_capacity(links + 1);
        for _ in 0..links {
            let reg = if float_capable && rng.random_bool(FLOAT_PROBABILITY) {
                Register::from(fprs[rng.random_range(0..fprs.len())])
            } else {
                Register::from(pick_gpr(rng))
            };
            chain.push(reg);
        }
        chain.push(pick_gpr(rng).into());

        chain
    }

    /// Instruction reading `src` and writing `dest`.
    fn gen_link(
        &self,
        ctx: &mut GenContext,
        src: Register,
        dest: Register,
    ) -> Result<Instruction, BlockError> {
        match (src, dest) {
            (Register::X(src), Register::F(dest)) => Ok(Instruction::x_to_float(dest, src)),

            (Register::F(src), Register::X(dest)) => Ok(Instruction::float_to_x(dest, src)),

            (Register::F(src), Register::F(dest)) => {
                let extensions = self
                    .body
                    .extensions
                    .iter()
                    .copied()
                    .filter(|ext| FLOAT_LINK_EXTENSIONS.contains(ext));
                let request = Constraints::new(extensions)
                    .categories([Category::Float])
                    .with(Constraint::equals(Field::Frd, dest))
                    .with(Constraint::uses(Field::Frd))
                    .with(Constraint::uses(Field::Frs1));
                let mut instr = ctx.select_where(&request, |instr| instr.has(Field::Frd))?;

                let slots: Vec<Field> = Field::FPR_SOURCES
                    .into_iter()
                    .filter(|field| instr.has(*field))
                    .collect();
                let linked = slots
                    .iter()
                    .any(|field| instr.register(*field) == Some(src.into()));
                if !linked {
                    if let Some(slot) = slots.choose(&mut ctx.rng) {
                        instr.set(*slot, src)?;
                    }
                }

                Ok(instr)
            }

            (Register::X(src), Register::X(dest)) => {
                let request = Constraints::new(self.body.extensions.iter().copied())
                    .categories([Category::Arithmetic])
                    .with(Constraint::equals(Field::Rd, dest))
                    .with(Constraint::any_equals(Field::GPR_SOURCES, src))
                    .with(Constraint::within(Field::GPR_SOURCES, gpr_pool()));
                ctx.select_where(&request, |instr| instr.has(Field::Rd))
            }
        }
    }

    /// Initialisers for every register the links read before the chain defines it.
    fn gen_init(rng: &mut StdRng, chain: &[Register], links: &[Instruction]) -> Vec<AsmLine> {
        let mut defined = BTreeSet::new();
        let mut floats: Vec<FRegister> = Vec::new();
        let mut gprs: Vec<XRegister> = Vec::new();

        for (link, dest) in links.iter().zip(chain.iter().skip(1)) {
            for src in link.sources() {
                if defined.contains(&src) {
                    continue;
                }
                match src {
                    Register::F(f) if !floats.contains(&f) => floats.push(f),
                    Register::X(x) if !gprs.contains(&x) => gprs.push(x),
                    _ => {}
                }
            }
            defined.insert(*dest);
        }

        let mut lines = Vec::with_capacity(2 * floats.len() + gprs.len() + NOP_SLED);
        for f in floats {
            lines.push(AsmLine::raw(format!("li {SCRATCH}, {}", rng.random::<u64>())));
            lines.push(AsmLine::raw(format!("fcvt.s.lu {f}, {SCRATCH}")));
        }
        for x in gprs {
            lines.push(AsmLine::raw(format!("li {x}, {}", rng.random::<u64>())));
        }
        lines.extend(std::iter::repeat_n(AsmLine::raw("nop"), NOP_SLED));

        lines
    }
}

impl Block for DelayBlock {
    fn body(&self) -> &BlockBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut BlockBody {
        &mut self.body
    }

    fn gen_default(&mut self, ctx: &mut GenContext) -> Result<(), BlockError> {
        self.body.instructions = ctx.templates.load("delay.text.S")?;
        self.body.data = ctx.templates.load("delay.data.S")?;
        self.result = Some(DelayResult {
            register: XRegister::t0,
            imm: 0,
        });
        Ok(())
    }

    fn gen_random(&mut self, ctx: &mut GenContext) -> Result<(), BlockError> {
        let chain = self.gen_chain(&mut ctx.rng);
        crate::log::debug!(chain = %chain.iter().join(" -> "), "Delay chain");

        let links = chain
            .windows(2)
            .map(|pair| self.gen_link(ctx, pair[0], pair[1]))
            .collect::<Result<Vec<_>, _>>()?;

        let mut instructions = Self::gen_init(&mut ctx.rng, &chain, &links);
        instructions.extend(links.into_iter().map(AsmLine::from));

        let register = match chain.last() {
            Some(Register::X(reg)) => *reg,
            _ => {
                return Err(BlockError::precondition(
                    &self.body.name,
                    "dependency chain must end in an integer register",
                ));
            }
        };

        self.body.instructions = instructions;
        self.chain = chain;
        self.result = Some(DelayResult { register, imm: 0 });
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::fs;

    use proptest::prelude::any;
    use proptest::prop_assert;
    use proptest::prop_assert_eq;
    use proptest::proptest;

    use super::*;
    use crate::isa::registers::RESERVED;
    use crate::selector::CatalogueSelector;
    use crate::templates::TRANS_DIR;
    use crate::templates::TemplateDir;

    const RV64GC: [Extension; 8] = [
        Extension::RV_I,
        Extension::RV64_I,
        Extension::RV_M,
        Extension::RV64_M,
        Extension::RV_F,
        Extension::RV64_F,
        Extension::RV_D,
        Extension::RV64_D,
    ];

    fn generate(seed: u64, extensions: &[Extension]) -> DelayBlock {
        let mut ctx = GenContext::new(seed, CatalogueSelector::default(), TemplateDir::default());
        let mut delay = DelayBlock::new("delay", extensions.iter().copied(), false);
        delay.gen_instr(&mut ctx).unwrap();
        delay
    }

    fn links(delay: &DelayBlock) -> &[AsmLine] {
        let instructions = &delay.body().instructions;
        &instructions[instructions.len() - (delay.chain().len() - 1)..]
    }

    #[test]
    fn test_chain_shape() {
        proptest!(|(seed in any::<u64>())| {
            let delay = generate(seed, &RV64GC);
            let chain = delay.chain();

            prop_assert!((7..=9).contains(&chain.len()));

            let last = chain[chain.len() - 1].as_x();
            prop_assert!(last.is_some_and(|reg| !RESERVED.contains(&reg)));
            prop_assert_eq!(delay.result_reg(), last);
            prop_assert_eq!(delay.result_imm(), Some(0));
        });
    }

    #[test]
    fn test_links_follow_chain() {
        proptest!(|(seed in any::<u64>())| {
            let delay = generate(seed, &RV64GC);
            let chain = delay.chain();

            for (i, line) in links(&delay).iter().enumerate() {
                let link = line.as_instruction();
                prop_assert!(link.is_some(), "{line} is not structured");
                let link = link.unwrap();

                prop_assert_eq!(link.destination(), Some(chain[i + 1]));
                prop_assert!(link.sources().any(|src| src == chain[i]), "{link} does not read {}", chain[i]);

                // Connecting instructions never touch the argument registers or zero
                for reg in link.sources().chain(link.destination()) {
                    if let Register::X(x) = reg {
                        prop_assert!(!RESERVED.contains(&x), "{link} uses {x}");
                    }
                }
            }
        });
    }

    #[test]
    fn test_nop_sled_precedes_links() {
        proptest!(|(seed in any::<u64>())| {
            let delay = generate(seed, &RV64GC);
            let instructions = &delay.body().instructions;
            let first_link = instructions.len() - (delay.chain().len() - 1);

            let sled = &instructions[first_link - NOP_SLED..first_link];
            prop_assert!(sled.iter().all(|line| *line == AsmLine::raw("nop")));
            prop_assert!(instructions[..first_link - NOP_SLED]
                .iter()
                .all(|line| *line != AsmLine::raw("nop")));
        });
    }

    #[test]
    fn test_each_early_read_initialised_once() {
        proptest!(|(seed in any::<u64>())| {
            let delay = generate(seed, &RV64GC);
            let chain = delay.chain();
            let instructions = &delay.body().instructions;
            let prelude = &instructions[..instructions.len() - (chain.len() - 1) - NOP_SLED];

            // Registers read before the chain writes them
            let mut defined = BTreeSet::new();
            let mut expected = BTreeSet::new();
            for (i, line) in links(&delay).iter().enumerate() {
                let link = line.as_instruction().unwrap();
                expected.extend(link.sources().filter(|src| !defined.contains(src)));
                defined.insert(chain[i + 1]);
            }

            let mut inits: BTreeMap<String, usize> = BTreeMap::new();
            let mut scratch_loads = 0;
            for line in prelude {
                let text = line.to_string();
                if let Some(rest) = text.strip_prefix("fcvt.s.lu ") {
                    let reg = rest.split(',').next().unwrap().to_owned();
                    *inits.entry(reg).or_default() += 1;
                } else if let Some(rest) = text.strip_prefix("li ") {
                    let reg = rest.split(',').next().unwrap().to_owned();
                    if reg == "t0" {
                        scratch_loads += 1;
                    } else {
                        *inits.entry(reg).or_default() += 1;
                    }
                } else {
                    prop_assert!(false, "Unexpected initialiser {text}");
                }
            }

            let floats = expected.iter().filter(|reg| reg.is_fpr()).count();
            let t0 = Register::from(XRegister::t0);
            prop_assert_eq!(scratch_loads, floats + usize::from(expected.contains(&t0)));

            for reg in &expected {
                if *reg != t0 {
                    prop_assert_eq!(inits.get(&reg.to_string()), Some(&1), "{}", reg);
                }
            }
            prop_assert_eq!(inits.len() + usize::from(expected.contains(&t0)), expected.len());
        });
    }

    #[test]
    fn test_integer_only_without_float_extensions() {
        proptest!(|(seed in any::<u64>())| {
            let delay = generate(seed, &[Extension::RV_I, Extension::RV_M]);
            prop_assert!(delay.chain().iter().all(|reg| reg.is_gpr()));
            for line in links(&delay) {
                let link = line.as_instruction().unwrap();
                prop_assert_eq!(link.category(), Category::Arithmetic);
            }
        });
    }

    #[test]
    fn test_integer_only_without_float_links() {
        let sets: [&[Extension]; 3] = [
            &[Extension::RV_I, Extension::RV64_I, Extension::RV_M, Extension::RV_C_D],
            &[Extension::RV_I, Extension::RV_M, Extension::RV32_C_F],
            &[Extension::RV_I, Extension::RV_F, Extension::RV_D],
        ];
        for extensions in sets {
            for seed in 0..200 {
                let delay = generate(seed, extensions);
                assert!(
                    delay.chain().iter().all(|reg| reg.is_gpr()),
                    "{extensions:?} seed {seed}"
                );
            }
        }
    }

    #[test]
    fn test_float_links_with_float_extensions() {
        let floats = (0..64)
            .map(|seed| generate(seed, &RV64GC))
            .filter(|delay| delay.chain().iter().any(|reg| reg.is_fpr()))
            .count();
        assert!(floats > 0);

        let single = [Extension::RV_I, Extension::RV64_I, Extension::RV_F, Extension::RV64_F];
        for seed in 0..200 {
            let delay = generate(seed, &single);
            for line in links(&delay) {
                let link = line.as_instruction().unwrap();
                assert!(single.contains(&link.mnemonic.extension()), "{link}");
            }
        }
    }

    #[test]
    fn test_default_mode_uses_templates() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(TRANS_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("delay.text.S"), "la t0, delay_value\nld t0, 0(t0)\n").unwrap();
        fs::write(dir.join("delay.data.S"), "delay_value: .dword 0\n").unwrap();

        let mut ctx = GenContext::new(0, CatalogueSelector::default(), TemplateDir::new(root.path()));
        let mut delay = DelayBlock::new("delay", RV64GC, true);
        delay.gen_instr(&mut ctx).unwrap();

        assert_eq!(delay.result(), Some(DelayResult { register: XRegister::t0, imm: 0 }));
        assert!(delay.chain().is_empty());
        assert_eq!(delay.body().instructions.len(), 2);
        assert_eq!(delay.body().data.len(), 1);
    }
}
