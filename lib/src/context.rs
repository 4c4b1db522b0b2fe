// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Generation context
//!
//! Everything a block needs from the outside world while generating: the random number
//! generator, the instruction selector and the template root. A context is created once per
//! test case and threaded through every block, so that a seed fully determines the output.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::blocks::BlockError;
use crate::config::GeneratorConfig;
use crate::isa::Instruction;
use crate::selector::CatalogueSelector;
use crate::selector::Constraints;
use crate::selector::InstructionSelector;
use crate::selector::SelectionExhausted;
use crate::templates::TemplateDir;

/// Default number of selector queries for a request whose results keep being rejected
pub const DEFAULT_RETRY_BUDGET: usize = 64;

pub struct GenContext {
    seed: u64,
    pub rng: StdRng,
    pub templates: TemplateDir,
    selector: Box<dyn InstructionSelector>,
    retry_budget: usize,
}

impl GenContext {
    pub fn new(
        seed: u64,
        selector: impl InstructionSelector + 'static,
        templates: TemplateDir,
    ) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            templates,
            selector: Box::new(selector),
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }

    /// Context described by `config`. Without a configured seed a fresh one is drawn from the
    /// thread-local generator; [`GenContext::seed`] reports it so the run can be reproduced.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        crate::log::info!(seed, "Generation context created");

        Self::new(
            seed,
            CatalogueSelector::new(config.selector_attempts),
            TemplateDir::new(config.template_root.clone()),
        )
        .with_retry_budget(config.retry_budget)
    }

    pub fn with_retry_budget(mut self, retry_budget: usize) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn retry_budget(&self) -> usize {
        self.retry_budget
    }

    /// Ask the selector for one instruction satisfying `constraints`.
    pub fn select(&mut self, constraints: &Constraints) -> Result<Instruction, BlockError> {
        self.select_where(constraints, |_| true)
    }

    /// Ask the selector repeatedly until it returns an instruction `accept` agrees with. Gives
    /// up with [`BlockError::SelectionExhausted`] once the retry budget is spent.
    pub fn select_where(
        &mut self,
        constraints: &Constraints,
        accept: impl Fn(&Instruction) -> bool,
    ) -> Result<Instruction, BlockError> {
        for _ in 0..self.retry_budget {
            let instr = self.selector.select(&mut self.rng, constraints)?;
            if accept(&instr) {
                crate::log::trace!(%instr, "Selected instruction");
                return Ok(instr);
            }
        }

        crate::log::warning!(%constraints, budget = self.retry_budget, "Retry budget spent");
        Err(SelectionExhausted {
            constraints: Box::new(constraints.clone()),
            attempts: self.retry_budget,
        }
        .into())
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;

    use super::*;
    use crate::isa::Extension;
    use crate::isa::Field;
    use crate::isa::Mnemonic;
    use crate::isa::XRegister;

    /// Always answers with the same instruction.
    struct Fixed(Instruction);

    impl InstructionSelector for Fixed {
        fn select(
            &mut self,
            _rng: &mut StdRng,
            _constraints: &Constraints,
        ) -> Result<Instruction, SelectionExhausted> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_same_seed_same_choices() {
        let request = Constraints::new([Extension::RV_I, Extension::RV_M])
            .categories([crate::isa::Category::Arithmetic]);

        let mut a = GenContext::new(7, CatalogueSelector::default(), TemplateDir::default());
        let mut b = GenContext::new(7, CatalogueSelector::default(), TemplateDir::default());

        for _ in 0..16 {
            assert_eq!(a.select(&request).unwrap(), b.select(&request).unwrap());
        }
    }

    #[test]
    fn test_rejections_are_bounded() {
        let add = Instruction::r_type(Mnemonic::Add, XRegister::t0, XRegister::t1, XRegister::t2);
        let mut ctx =
            GenContext::new(0, Fixed(add), TemplateDir::default()).with_retry_budget(5);

        let request = Constraints::new([Extension::RV_I]);
        let err = ctx
            .select_where(&request, |instr| instr.has(Field::Imm))
            .unwrap_err();

        match err {
            BlockError::SelectionExhausted(exhausted) => {
                assert_eq!(exhausted.attempts, 5);
                assert_eq!(*exhausted.constraints, request);
            }
            other => panic!("Unexpected error {other}"),
        }
    }

    #[test]
    fn test_from_config_uses_configured_seed() {
        let config = GeneratorConfig {
            seed: Some(42),
            retry_budget: 3,
            ..GeneratorConfig::default()
        };
        let ctx = GenContext::from_config(&config);
        assert_eq!(ctx.seed(), 42);
        assert_eq!(ctx.retry_budget(), 3);
        assert_eq!(ctx.templates.root(), config.template_root.as_path());
    }
}
