// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Register names as they appear in generated assembly.

use serde::Deserialize;
use serde::Serialize;
use strum::IntoEnumIterator;

/// Integer registers, by ABI name
#[expect(non_camel_case_types, reason = "Consistent with the RISC-V assembler syntax")]
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
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum XRegister {
    zero = 0,
    ra,
    sp,
    gp,
    tp,
    t0,
    t1,
    t2,
    s0,
    s1,
    a0,
    a1,
    a2,
    a3,
    a4,
    a5,
    a6,
    a7,
    s2,
    s3,
    s4,
    s5,
    s6,
    s7,
    s8,
    s9,
    s10,
    s11,
    t3,
    t4,
    t5,
    t6,
}

/// Floating-point registers
#[expect(non_camel_case_types, reason = "Consistent with the RISC-V assembler syntax")]
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
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum FRegister {
    f0 = 0,
    f1,
    f2,
    f3,
    f4,
    f5,
    f6,
    f7,
    f8,
    f9,
    f10,
    f11,
    f12,
    f13,
    f14,
    f15,
    f16,
    f17,
    f18,
    f19,
    f20,
    f21,
    f22,
    f23,
    f24,
    f25,
    f26,
    f27,
    f28,
    f29,
    f30,
    f31,
}

/// Integer registers the generated code may never pick freely: the two argument registers
/// carrying the trigger and offset parameters, and the hard-wired zero.
pub const RESERVED: [XRegister; 3] = [XRegister::a0, XRegister::a1, XRegister::zero];

/// Register carrying the trigger parameter of a predict mechanism.
pub const TRIGGER_ARG: XRegister = XRegister::a0;

/// Register carrying the offset parameter of the victim access.
pub const OFFSET_ARG: XRegister = XRegister::a1;

/// Either kind of architectural register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Register {
    X(XRegister),
    F(FRegister),
}

impl Register {
    /// Is this a general-purpose (integer) register?
    pub fn is_gpr(self) -> bool {
        matches!(self, Register::X(_))
    }

    /// Is this a floating-point register?
    pub fn is_fpr(self) -> bool {
        matches!(self, Register::F(_))
    }

    /// Returns the integer register, if this is one.
    pub fn as_x(self) -> Option<XRegister> {
        match self {
            Register::X(x) => Some(x),
            Register::F(_) => None,
        }
    }

    /// Returns the floating-point register, if this is one.
    pub fn as_f(self) -> Option<FRegister> {
        match self {
            Register::F(f) => Some(f),
            Register::X(_) => None,
        }
    }
}

impl From<XRegister> for Register {
    fn from(x: XRegister) -> Self {
        Register::X(x)
    }
}

impl From<FRegister> for Register {
    fn from(f: FRegister) -> Self {
        Register::F(f)
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Register::X(x) => x.fmt(f),
            Register::F(r) => r.fmt(f),
        }
    }
}

/// General-purpose registers available to synthesised code, i.e. all but [`RESERVED`].
pub fn gpr_pool() -> Vec<XRegister> {
    XRegister::iter().filter(|r| !RESERVED.contains(r)).collect()
}

/// Floating-point registers available to synthesised code.
pub fn fpr_pool() -> Vec<FRegister> {
    FRegister::iter().collect()
}
