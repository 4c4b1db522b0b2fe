// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use serde::Serialize;

/// ISA extension tags used to scope instruction selection
#[expect(non_camel_case_types, reason = "Consistent with RISC-V extension naming")]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Extension {
    RV_I,
    RV64_I,
    RV_M,
    RV64_M,
    RV_A,
    RV64_A,
    RV_F,
    RV64_F,
    RV_D,
    RV64_D,
    RV_C,
    RV64_C,
    RV32_C_F,
    RV_C_D,
}
