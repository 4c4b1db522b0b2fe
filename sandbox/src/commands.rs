// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

mod generate;

pub use generate::dump_config;
pub use generate::generate;
