// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use riscv_transient::GeneratorConfig;
use riscv_transient::config::ConfigError;
use riscv_transient::isa::Extension;

#[derive(Debug, Parser)]
#[command(about = "Generate RISC-V transient-execution test cases", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Mode,

    /// Emit logs as JSON. The log level is controlled through `RUST_LOG`.
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Mode {
    /// Generate one test case
    Generate(GenerateOptions),

    /// Print the effective configuration as JSON
    Config(ConfigOptions),
}

/// Configuration file and the flags overriding it
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// JSON configuration file
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// One of call, return, branch_taken, branch_not_taken
    #[arg(long)]
    pub predict_kind: Option<String>,

    /// Number of training runs
    #[arg(long)]
    pub train_loop: Option<usize>,

    /// Number of victim runs
    #[arg(long)]
    pub victim_loop: Option<usize>,

    /// Comma-separated extensions, e.g. RV_I,RV64_I,RV_M
    #[arg(long, value_delimiter = ',')]
    pub extensions: Option<Vec<Extension>>,

    /// Directory containing env/trans/*.S
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Load the delay chain from its template
    #[arg(long)]
    pub delay_default: bool,
}

impl ConfigArgs {
    /// Configuration from the file, if any, with the flags applied on top.
    pub fn resolve(&self) -> Result<GeneratorConfig, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => GeneratorConfig::from_file(path)?,
            None => GeneratorConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(kind) = &self.predict_kind {
            config.predict_kind = kind.clone();
        }
        if let Some(train_loop) = self.train_loop {
            config.train_loop = train_loop;
        }
        if let Some(victim_loop) = self.victim_loop {
            config.victim_loop = victim_loop;
        }
        if let Some(extensions) = &self.extensions {
            config.extensions = extensions.iter().copied().collect();
        }
        if let Some(templates) = &self.templates {
            config.template_root = templates.clone();
        }
        config.delay_default |= self.delay_default;

        Ok(config)
    }
}

#[derive(Debug, Clone, Args)]
pub struct GenerateOptions {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output file. The assembly is written to stdout when absent.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ConfigOptions {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn parse() -> Cli {
    Cli::parse()
}
