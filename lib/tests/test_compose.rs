// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

mod common;

use std::collections::BTreeSet;

use proptest::prelude::any;
use proptest::prop_assert;
use proptest::prop_assert_eq;
use proptest::proptest;
use riscv_transient::BlockError;
use riscv_transient::TestCase;
use riscv_transient::blocks::PredictKind;
use riscv_transient::isa::Extension;
use riscv_transient::isa::Register;
use riscv_transient::isa::XRegister;
use strum::IntoEnumIterator;

const PROGRAM_ORDER: [&str; 10] = [
    "init_secret",
    "train",
    "exit",
    "delay",
    "predict",
    "victim",
    "func_end",
    "poc_func",
    "poc",
    "trap",
];

#[test]
fn test_layout() {
    let root = common::template_tree();
    let config = common::config(&root, 11);
    let test_case = TestCase::generate(&config, &mut common::context(&config)).unwrap();

    let names: Vec<&str> = test_case.blocks().iter().map(|block| block.name()).collect();
    assert_eq!(names, PROGRAM_ORDER);
    assert!(test_case.blocks().iter().all(|block| block.body().is_generated()));

    let rendered = test_case.render();
    let (text, data) = rendered.split_once(".data\n").unwrap();
    assert!(text.starts_with(".text\n"));

    let mut last = 0;
    for name in PROGRAM_ORDER {
        let at = text.find(&format!("\n{name}:\n")).unwrap();
        assert!(at >= last, "{name} out of order");
        last = at;

        assert!(data.contains(&format!("{name}_data:\n")), "{name} has no data label");
    }

    assert!(data.contains("train_param_table:\n"));
    assert!(data.contains("victim_param_table:\n"));
    assert!(text.contains("\nj func_end\n"));
    assert!(rendered.ends_with('\n'));
}

#[test]
fn test_same_seed_same_program() {
    proptest!(|(seed in any::<u64>())| {
        let root = common::template_tree();
        let config = common::config(&root, seed);

        let first = TestCase::generate(&config, &mut common::context(&config)).unwrap();
        let second = TestCase::generate(&config, &mut common::context(&config)).unwrap();

        prop_assert_eq!(first.seed(), seed);
        prop_assert_eq!(first.render(), second.render());
    });
}

#[test]
fn test_every_predict_kind() {
    let root = common::template_tree();

    proptest!(|(seed in any::<u64>())| {
        for kind in PredictKind::iter() {
            let config = riscv_transient::GeneratorConfig {
                predict_kind: kind.to_string(),
                train_loop: 3,
                ..common::config(&root, seed)
            };
            let test_case = TestCase::generate(&config, &mut common::context(&config)).unwrap();
            let rendered = test_case.render();

            prop_assert_eq!(rendered.matches("j predict\n").count(), 3);
            prop_assert_eq!(rendered.matches("j delay\n").count(), 1);

            let delay_reg = test_case
                .block("delay")
                .and_then(|block| block.body().instructions.last())
                .and_then(|line| line.as_instruction())
                .and_then(|instr| instr.destination());
            prop_assert!(delay_reg.is_some());
            let loads = format!("ld {}, 16(t0)\n", delay_reg.unwrap());
            prop_assert!(rendered.contains(&loads), "{} missing", loads);

            if !kind.is_branch() {
                prop_assert!(rendered.contains(".dword victim - "));
                prop_assert!(rendered.contains(".dword func_end - 0 - "));
            }
        }
    });
}

#[test]
fn test_default_delay() {
    let root = common::template_tree();
    let config = riscv_transient::GeneratorConfig {
        delay_default: true,
        ..common::config(&root, 5)
    };
    let test_case = TestCase::generate(&config, &mut common::context(&config)).unwrap();
    let rendered = test_case.render();

    assert!(rendered.contains("delay:\nla t0, delay_value\nld t0, 0(t0)\npredict:\nxor t0, t0, t0\n"));
    assert!(rendered.contains("ld t0, 16(t0)\n"));
}

#[test]
fn test_need_store_covers_chain() {
    let root = common::template_tree();
    let config = common::config(&root, 23);
    let test_case = TestCase::generate(&config, &mut common::context(&config)).unwrap();

    let stored = test_case.need_store();
    let delay = test_case.block("delay").unwrap();
    assert!(delay.need_store().is_subset(&stored));
    assert!(stored.contains(&Register::from(XRegister::t0)));
}

#[test]
fn test_unknown_predict_kind() {
    let root = common::template_tree();
    let config = riscv_transient::GeneratorConfig {
        predict_kind: "indirect_jump".to_owned(),
        ..common::config(&root, 0)
    };

    assert!(matches!(
        TestCase::generate(&config, &mut common::context(&config)),
        Err(BlockError::Configuration { .. })
    ));
}

#[test]
fn test_missing_templates() {
    let root = tempfile::tempdir().unwrap();
    let config = riscv_transient::GeneratorConfig {
        seed: Some(0),
        template_root: root.path().to_path_buf(),
        ..Default::default()
    };

    assert!(matches!(
        TestCase::generate(&config, &mut common::context(&config)),
        Err(BlockError::Template { .. })
    ));
}

#[test]
fn test_no_extensions() {
    let root = common::template_tree();
    let config = riscv_transient::GeneratorConfig {
        extensions: BTreeSet::<Extension>::new(),
        ..common::config(&root, 0)
    };
    let test_case = TestCase::generate(&config, &mut common::context(&config)).unwrap();

    assert!(test_case.blocks().is_empty());
    assert_eq!(test_case.render(), ".text\n.data\n");
}
