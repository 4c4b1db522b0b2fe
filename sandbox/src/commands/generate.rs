// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::fs;

use riscv_transient::GenContext;
use riscv_transient::TestCase;

use crate::cli::ConfigOptions;
use crate::cli::GenerateOptions;

pub fn generate(opts: GenerateOptions) -> Result<(), Box<dyn Error>> {
    let config = opts.config.resolve()?;
    let mut ctx = GenContext::from_config(&config);
    let test_case = TestCase::generate(&config, &mut ctx)?;
    let asm = test_case.render();

    match &opts.output {
        Some(path) => {
            fs::write(path, asm)?;
            eprintln!("Wrote {} (seed {})", path.display(), test_case.seed());
        }
        None => {
            print!("{asm}");
            eprintln!("Seed {}", test_case.seed());
        }
    }

    Ok(())
}

pub fn dump_config(opts: ConfigOptions) -> Result<(), Box<dyn Error>> {
    let config = opts.config.resolve()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use riscv_transient::templates::TRANS_DIR;

    use super::*;
    use crate::cli::ConfigArgs;

    fn write_templates(root: &Path) {
        let dir = root.join(TRANS_DIR);
        fs::create_dir_all(&dir).unwrap();
        for stem in ["init_secret", "exit", "func_end", "trap", "delay"] {
            fs::write(dir.join(format!("{stem}.text.S")), "nop\n").unwrap();
            fs::write(dir.join(format!("{stem}.data.S")), "\n").unwrap();
        }
        for stem in ["poc_func", "poc", "victim"] {
            fs::write(dir.join(format!("{stem}.text.S")), "nop\n").unwrap();
        }
    }

    #[test]
    fn test_generate_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(dir.path());
        let output = dir.path().join("case.S");

        let opts = GenerateOptions {
            config: ConfigArgs {
                config_file: None,
                seed: Some(3),
                predict_kind: Some("return".to_owned()),
                train_loop: Some(2),
                victim_loop: None,
                extensions: None,
                templates: Some(dir.path().to_path_buf()),
                delay_default: false,
            },
            output: Some(output.clone()),
        };
        generate(opts).unwrap();

        let asm = fs::read_to_string(&output).unwrap();
        assert!(asm.starts_with(".text\ninit_secret:\n"));
        assert!(asm.contains("jalr zero, 0(ra)\n"));
        assert_eq!(asm.matches("j predict\n").count(), 2);
    }
}
