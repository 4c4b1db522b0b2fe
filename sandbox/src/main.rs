// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::error::Error;

use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

fn init_logging(json: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        cli::Mode::Generate(opts) => commands::generate(opts),
        cli::Mode::Config(opts) => commands::dump_config(opts),
    }
}
