// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::fs;

use riscv_transient::GenContext;
use riscv_transient::GeneratorConfig;
use riscv_transient::templates::TRANS_DIR;
use tempfile::TempDir;

/// Minimal fragments for every canned block
const FRAGMENTS: [(&str, &str); 12] = [
    ("init_secret.text.S", "la t0, secret\nli t1, 42\nsb t1, 0(t0)\n"),
    ("init_secret.data.S", "secret: .byte 0\n"),
    ("exit.text.S", "li a7, 93\necall\n"),
    ("exit.data.S", "\n"),
    ("delay.text.S", "la t0, delay_value\nld t0, 0(t0)\n"),
    ("delay.data.S", "delay_value: .dword 0\n"),
    ("victim.text.S", "add t1, a1, t0\nlb t1, 0(t1)\n"),
    ("func_end.text.S", "la t0, store_ra\nld t0, 0(t0)\njr t0\n"),
    ("func_end.data.S", "store_ra: .dword 0\ntrapoline: .dword 0\n"),
    ("poc_func.text.S", "fence\n"),
    ("poc.text.S", "rdcycle t0\n"),
    ("trap.text.S", "  csrr t0, mepc\n  addi t0, t0, 4\n  csrw mepc, t0\n  mret\n"),
];

/// Template tree with every fragment, plus `trap.data.S`.
pub fn template_tree() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join(TRANS_DIR);
    fs::create_dir_all(&dir).unwrap();

    for (name, contents) in FRAGMENTS {
        fs::write(dir.join(name), contents).unwrap();
    }
    fs::write(dir.join("trap.data.S"), "trap_count: .dword 0\n").unwrap();

    root
}

/// Configuration generating from `root` with `seed`.
pub fn config(root: &TempDir, seed: u64) -> GeneratorConfig {
    GeneratorConfig {
        seed: Some(seed),
        template_root: root.path().to_path_buf(),
        ..GeneratorConfig::default()
    }
}

pub fn context(config: &GeneratorConfig) -> GenContext {
    GenContext::from_config(config)
}
