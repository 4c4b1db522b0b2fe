// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Structured instructions
//!
//! An [`Instruction`] is a [`Mnemonic`] paired with [`Operands`]. The operands are a tagged
//! variant per operand format, so only the fields meaningful to an instruction exist. Generic
//! access goes through [`Field`]: [`Instruction::get`] answers presence and value,
//! [`Instruction::set`] patches a present field before the instruction is emitted.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Deserialize;
use serde::Serialize;

use super::extension::Extension;
use super::registers::FRegister;
use super::registers::Register;
use super::registers::XRegister;

/// Instruction categories understood by the selector
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
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Arithmetic,
    Float,
    Jump,
    Branch,
    Load,
    Store,
}

/// Operand layout of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `rd, rs1, rs2`
    R,
    /// `rd, rs1, imm12`
    I,
    /// `rd, rs1, shamt6`
    Shift64,
    /// `rd, rs1, shamt5`
    Shift32,
    /// `rd, imm20`
    U,
    /// `rd, imm12(rs1)`
    Load,
    /// `rs2, imm12(rs1)`
    Store,
    /// `rs1, rs2, label`
    Branch,
    /// `rd, label`
    Jal,
    /// `rd, imm12(rs1)`
    Jalr,
    /// `frd, frs1`
    FR1,
    /// `frd, frs1, frs2`
    FR2,
    /// `frd, frs1, frs2, frs3`
    FR3,
    /// `rd, frs1, frs2`
    FCmp,
    /// `rd, frs1`
    FToX,
    /// `frd, rs1`
    XToF,
}

impl Format {
    /// Fields populated by instructions of this format.
    pub const fn fields(self) -> &'static [Field] {
        match self {
            Format::R => &[Field::Rd, Field::Rs1, Field::Rs2],
            Format::I | Format::Shift64 | Format::Shift32 | Format::Load | Format::Jalr => {
                &[Field::Rd, Field::Rs1, Field::Imm]
            }
            Format::U => &[Field::Rd, Field::Imm],
            Format::Store => &[Field::Rs1, Field::Rs2, Field::Imm],
            Format::Branch => &[Field::Rs1, Field::Rs2],
            Format::Jal => &[Field::Rd],
            Format::FR1 => &[Field::Frd, Field::Frs1],
            Format::FR2 => &[Field::Frd, Field::Frs1, Field::Frs2],
            Format::FR3 => &[Field::Frd, Field::Frs1, Field::Frs2, Field::Frs3],
            Format::FCmp => &[Field::Rd, Field::Frs1, Field::Frs2],
            Format::FToX => &[Field::Rd, Field::Frs1],
            Format::XToF => &[Field::Frd, Field::Rs1],
        }
    }

    /// Does this format populate `field`?
    pub fn has(self, field: Field) -> bool {
        self.fields().contains(&field)
    }

    /// Encodable immediate values, for formats carrying an immediate.
    pub fn imm_range(self) -> Option<RangeInclusive<i64>> {
        match self {
            Format::I | Format::Load | Format::Store | Format::Jalr => Some(-2048..=2047),
            Format::Shift64 => Some(0..=63),
            Format::Shift32 => Some(0..=31),
            Format::U => Some(0..=0xF_FFFF),
            _ => None,
        }
    }

    /// Does this format take a control-flow target label?
    pub const fn has_label(self) -> bool {
        matches!(self, Format::Branch | Format::Jal)
    }

    /// Operands of this format with every field at its zero value.
    fn blank(self) -> Operands {
        use XRegister::zero;
        const F0: FRegister = FRegister::f0;

        match self {
            Format::R => Operands::R {
                rd: zero,
                rs1: zero,
                rs2: zero,
            },
            Format::I | Format::Shift64 | Format::Shift32 | Format::Load | Format::Jalr => {
                Operands::I {
                    rd: zero,
                    rs1: zero,
                    imm: 0,
                }
            }
            Format::U => Operands::U { rd: zero, imm: 0 },
            Format::Store => Operands::S {
                rs1: zero,
                rs2: zero,
                imm: 0,
            },
            Format::Branch => Operands::B {
                rs1: zero,
                rs2: zero,
                target: String::new(),
            },
            Format::Jal => Operands::J {
                rd: zero,
                target: String::new(),
            },
            Format::FR1 => Operands::F {
                frd: F0,
                frs1: F0,
                frs2: None,
                frs3: None,
            },
            Format::FR2 => Operands::F {
                frd: F0,
                frs1: F0,
                frs2: Some(F0),
                frs3: None,
            },
            Format::FR3 => Operands::F {
                frd: F0,
                frs1: F0,
                frs2: Some(F0),
                frs3: Some(F0),
            },
            Format::FCmp => Operands::FToX {
                rd: zero,
                frs1: F0,
                frs2: Some(F0),
            },
            Format::FToX => Operands::FToX {
                rd: zero,
                frs1: F0,
                frs2: None,
            },
            Format::XToF => Operands::XToF { frd: F0, rs1: zero },
        }
    }
}

/// Static description of a mnemonic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrSpec {
    pub category: Category,
    pub extension: Extension,
    pub format: Format,
}

macro_rules! mnemonics {
    ($($variant:ident = $asm:tt : $category:ident, $extension:ident, $format:ident;)*) => {
        /// Mnemonics known to the instruction catalogue
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
        pub enum Mnemonic {
            $(
                #[strum(to_string = $asm)]
                #[serde(rename = $asm)]
                $variant,
            )*
        }

        impl Mnemonic {
            /// Category, extension and operand format of this mnemonic.
            pub const fn spec(self) -> InstrSpec {
                match self {
                    $(
                        Self::$variant => InstrSpec {
                            category: Category::$category,
                            extension: Extension::$extension,
                            format: Format::$format,
                        },
                    )*
                }
            }
        }
    };
}

mnemonics! {
    Add = "add": Arithmetic, RV_I, R;
    Sub = "sub": Arithmetic, RV_I, R;
    Sll = "sll": Arithmetic, RV_I, R;
    Slt = "slt": Arithmetic, RV_I, R;
    Sltu = "sltu": Arithmetic, RV_I, R;
    Xor = "xor": Arithmetic, RV_I, R;
    Srl = "srl": Arithmetic, RV_I, R;
    Sra = "sra": Arithmetic, RV_I, R;
    Or = "or": Arithmetic, RV_I, R;
    And = "and": Arithmetic, RV_I, R;
    Addi = "addi": Arithmetic, RV_I, I;
    Slti = "slti": Arithmetic, RV_I, I;
    Sltiu = "sltiu": Arithmetic, RV_I, I;
    Xori = "xori": Arithmetic, RV_I, I;
    Ori = "ori": Arithmetic, RV_I, I;
    Andi = "andi": Arithmetic, RV_I, I;
    Slli = "slli": Arithmetic, RV_I, Shift64;
    Srli = "srli": Arithmetic, RV_I, Shift64;
    Srai = "srai": Arithmetic, RV_I, Shift64;
    Lui = "lui": Arithmetic, RV_I, U;
    Auipc = "auipc": Arithmetic, RV_I, U;

    Addw = "addw": Arithmetic, RV64_I, R;
    Subw = "subw": Arithmetic, RV64_I, R;
    Sllw = "sllw": Arithmetic, RV64_I, R;
    Srlw = "srlw": Arithmetic, RV64_I, R;
    Sraw = "sraw": Arithmetic, RV64_I, R;
    Addiw = "addiw": Arithmetic, RV64_I, I;
    Slliw = "slliw": Arithmetic, RV64_I, Shift32;
    Srliw = "srliw": Arithmetic, RV64_I, Shift32;
    Sraiw = "sraiw": Arithmetic, RV64_I, Shift32;

    Mul = "mul": Arithmetic, RV_M, R;
    Mulh = "mulh": Arithmetic, RV_M, R;
    Mulhsu = "mulhsu": Arithmetic, RV_M, R;
    Mulhu = "mulhu": Arithmetic, RV_M, R;
    Div = "div": Arithmetic, RV_M, R;
    Divu = "divu": Arithmetic, RV_M, R;
    Rem = "rem": Arithmetic, RV_M, R;
    Remu = "remu": Arithmetic, RV_M, R;
    Mulw = "mulw": Arithmetic, RV64_M, R;
    Divw = "divw": Arithmetic, RV64_M, R;
    Divuw = "divuw": Arithmetic, RV64_M, R;
    Remw = "remw": Arithmetic, RV64_M, R;
    Remuw = "remuw": Arithmetic, RV64_M, R;

    Beq = "beq": Branch, RV_I, Branch;
    Bne = "bne": Branch, RV_I, Branch;
    Blt = "blt": Branch, RV_I, Branch;
    Bge = "bge": Branch, RV_I, Branch;
    Bltu = "bltu": Branch, RV_I, Branch;
    Bgeu = "bgeu": Branch, RV_I, Branch;

    Jal = "jal": Jump, RV_I, Jal;
    Jalr = "jalr": Jump, RV_I, Jalr;

    Lb = "lb": Load, RV_I, Load;
    Lh = "lh": Load, RV_I, Load;
    Lw = "lw": Load, RV_I, Load;
    Lbu = "lbu": Load, RV_I, Load;
    Lhu = "lhu": Load, RV_I, Load;
    Lwu = "lwu": Load, RV64_I, Load;
    Ld = "ld": Load, RV64_I, Load;
    Sb = "sb": Store, RV_I, Store;
    Sh = "sh": Store, RV_I, Store;
    Sw = "sw": Store, RV_I, Store;
    Sd = "sd": Store, RV64_I, Store;

    FaddS = "fadd.s": Float, RV_F, FR2;
    FsubS = "fsub.s": Float, RV_F, FR2;
    FmulS = "fmul.s": Float, RV_F, FR2;
    FdivS = "fdiv.s": Float, RV_F, FR2;
    FminS = "fmin.s": Float, RV_F, FR2;
    FmaxS = "fmax.s": Float, RV_F, FR2;
    FsgnjS = "fsgnj.s": Float, RV_F, FR2;
    FsgnjnS = "fsgnjn.s": Float, RV_F, FR2;
    FsgnjxS = "fsgnjx.s": Float, RV_F, FR2;
    FsqrtS = "fsqrt.s": Float, RV_F, FR1;
    FmaddS = "fmadd.s": Float, RV_F, FR3;
    FmsubS = "fmsub.s": Float, RV_F, FR3;
    FnmaddS = "fnmadd.s": Float, RV_F, FR3;
    FnmsubS = "fnmsub.s": Float, RV_F, FR3;
    FeqS = "feq.s": Float, RV_F, FCmp;
    FltS = "flt.s": Float, RV_F, FCmp;
    FleS = "fle.s": Float, RV_F, FCmp;
    FcvtWS = "fcvt.w.s": Float, RV_F, FToX;
    FcvtWuS = "fcvt.wu.s": Float, RV_F, FToX;
    FmvXW = "fmv.x.w": Float, RV_F, FToX;
    FcvtSW = "fcvt.s.w": Float, RV_F, XToF;
    FcvtSWu = "fcvt.s.wu": Float, RV_F, XToF;
    FmvWX = "fmv.w.x": Float, RV_F, XToF;
    FcvtLS = "fcvt.l.s": Float, RV64_F, FToX;
    FcvtLuS = "fcvt.lu.s": Float, RV64_F, FToX;
    FcvtSL = "fcvt.s.l": Float, RV64_F, XToF;
    FcvtSLu = "fcvt.s.lu": Float, RV64_F, XToF;

    FaddD = "fadd.d": Float, RV_D, FR2;
    FsubD = "fsub.d": Float, RV_D, FR2;
    FmulD = "fmul.d": Float, RV_D, FR2;
    FdivD = "fdiv.d": Float, RV_D, FR2;
    FminD = "fmin.d": Float, RV_D, FR2;
    FmaxD = "fmax.d": Float, RV_D, FR2;
    FsgnjD = "fsgnj.d": Float, RV_D, FR2;
    FsgnjnD = "fsgnjn.d": Float, RV_D, FR2;
    FsgnjxD = "fsgnjx.d": Float, RV_D, FR2;
    FsqrtD = "fsqrt.d": Float, RV_D, FR1;
    FcvtSD = "fcvt.s.d": Float, RV_D, FR1;
    FcvtDS = "fcvt.d.s": Float, RV_D, FR1;
    FmaddD = "fmadd.d": Float, RV_D, FR3;
    FmsubD = "fmsub.d": Float, RV_D, FR3;
    FnmaddD = "fnmadd.d": Float, RV_D, FR3;
    FnmsubD = "fnmsub.d": Float, RV_D, FR3;
    FeqD = "feq.d": Float, RV_D, FCmp;
    FltD = "flt.d": Float, RV_D, FCmp;
    FleD = "fle.d": Float, RV_D, FCmp;
    FcvtWD = "fcvt.w.d": Float, RV_D, FToX;
    FcvtWuD = "fcvt.wu.d": Float, RV_D, FToX;
    FcvtDW = "fcvt.d.w": Float, RV_D, XToF;
    FcvtDWu = "fcvt.d.wu": Float, RV_D, XToF;
    FcvtLD = "fcvt.l.d": Float, RV64_D, FToX;
    FcvtLuD = "fcvt.lu.d": Float, RV64_D, FToX;
    FmvXD = "fmv.x.d": Float, RV64_D, FToX;
    FcvtDL = "fcvt.d.l": Float, RV64_D, XToF;
    FcvtDLu = "fcvt.d.lu": Float, RV64_D, XToF;
    FmvDX = "fmv.d.x": Float, RV64_D, XToF;
}

impl Mnemonic {
    pub fn category(self) -> Category {
        self.spec().category
    }

    pub fn extension(self) -> Extension {
        self.spec().extension
    }

    pub fn format(self) -> Format {
        self.spec().format
    }
}

/// Named operand slots of an instruction
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
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Field {
    Rd,
    Rs1,
    Rs2,
    Frd,
    Frs1,
    Frs2,
    Frs3,
    Imm,
}

impl Field {
    /// Integer source fields
    pub const GPR_SOURCES: [Field; 2] = [Field::Rs1, Field::Rs2];

    /// Floating-point source fields
    pub const FPR_SOURCES: [Field; 3] = [Field::Frs1, Field::Frs2, Field::Frs3];
}

/// Value held by a [`Field`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Reg(Register),
    Imm(i64),
}

impl Operand {
    pub fn as_register(self) -> Option<Register> {
        match self {
            Operand::Reg(reg) => Some(reg),
            Operand::Imm(_) => None,
        }
    }
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Operand::Reg(reg)
    }
}

impl From<XRegister> for Operand {
    fn from(reg: XRegister) -> Self {
        Operand::Reg(reg.into())
    }
}

impl From<FRegister> for Operand {
    fn from(reg: FRegister) -> Self {
        Operand::Reg(reg.into())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => reg.fmt(f),
            Operand::Imm(imm) => imm.fmt(f),
        }
    }
}

/// Operands, one variant per operand shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operands {
    R {
        rd: XRegister,
        rs1: XRegister,
        rs2: XRegister,
    },
    I {
        rd: XRegister,
        rs1: XRegister,
        imm: i64,
    },
    U {
        rd: XRegister,
        imm: i64,
    },
    S {
        rs1: XRegister,
        rs2: XRegister,
        imm: i64,
    },
    B {
        rs1: XRegister,
        rs2: XRegister,
        target: String,
    },
    J {
        rd: XRegister,
        target: String,
    },
    F {
        frd: FRegister,
        frs1: FRegister,
        frs2: Option<FRegister>,
        frs3: Option<FRegister>,
    },
    FToX {
        rd: XRegister,
        frs1: FRegister,
        frs2: Option<FRegister>,
    },
    XToF {
        frd: FRegister,
        rs1: XRegister,
    },
}

/// Failure to patch a field of an [`Instruction`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{mnemonic} has no {field} field")]
    Absent { mnemonic: Mnemonic, field: Field },

    #[error("{value} is not a valid value for field {field} of {mnemonic}")]
    Mismatch {
        mnemonic: Mnemonic,
        field: Field,
        value: Operand,
    },

    #[error("{mnemonic} does not take a target label")]
    NoTarget { mnemonic: Mnemonic },
}

/// A concrete instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub operands: Operands,
}

impl Instruction {
    /// Instruction with every field of the mnemonic's format zeroed.
    pub fn blank(mnemonic: Mnemonic) -> Self {
        Self {
            mnemonic,
            operands: mnemonic.format().blank(),
        }
    }

    /// `mnemonic rd, rs1, rs2`
    pub fn r_type(mnemonic: Mnemonic, rd: XRegister, rs1: XRegister, rs2: XRegister) -> Self {
        debug_assert_eq!(mnemonic.format(), Format::R);
        Self {
            mnemonic,
            operands: Operands::R { rd, rs1, rs2 },
        }
    }

    /// Convert an unsigned integer register to a single-precision float register.
    pub fn x_to_float(frd: FRegister, rs1: XRegister) -> Self {
        Self {
            mnemonic: Mnemonic::FcvtSLu,
            operands: Operands::XToF { frd, rs1 },
        }
    }

    /// Convert a single-precision float register to an unsigned integer register.
    pub fn float_to_x(rd: XRegister, frs1: FRegister) -> Self {
        Self {
            mnemonic: Mnemonic::FcvtLuS,
            operands: Operands::FToX {
                rd,
                frs1,
                frs2: None,
            },
        }
    }

    pub fn category(&self) -> Category {
        self.mnemonic.category()
    }

    /// Does this instruction populate `field`?
    pub fn has(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    /// Value of `field`, or `None` if the field is absent.
    pub fn get(&self, field: Field) -> Option<Operand> {
        use Operands::*;

        match (&self.operands, field) {
            (R { rd, .. } | I { rd, .. } | U { rd, .. } | J { rd, .. }, Field::Rd) => {
                Some((*rd).into())
            }
            (FToX { rd, .. }, Field::Rd) => Some((*rd).into()),
            (
                R { rs1, .. } | I { rs1, .. } | S { rs1, .. } | B { rs1, .. } | XToF { rs1, .. },
                Field::Rs1,
            ) => Some((*rs1).into()),
            (R { rs2, .. } | S { rs2, .. } | B { rs2, .. }, Field::Rs2) => Some((*rs2).into()),
            (I { imm, .. } | U { imm, .. } | S { imm, .. }, Field::Imm) => Some(Operand::Imm(*imm)),
            (F { frd, .. } | XToF { frd, .. }, Field::Frd) => Some((*frd).into()),
            (F { frs1, .. } | FToX { frs1, .. }, Field::Frs1) => Some((*frs1).into()),
            (F { frs2, .. } | FToX { frs2, .. }, Field::Frs2) => frs2.map(Operand::from),
            (F { frs3, .. }, Field::Frs3) => frs3.map(Operand::from),
            _ => None,
        }
    }

    /// Register held by `field`, or `None` if absent or not a register field.
    pub fn register(&self, field: Field) -> Option<Register> {
        self.get(field).and_then(Operand::as_register)
    }

    /// Patch a present field.
    pub fn set(&mut self, field: Field, value: impl Into<Operand>) -> Result<(), FieldError> {
        use Operands::*;

        let value = value.into();
        let mnemonic = self.mnemonic;
        let mismatch = || FieldError::Mismatch {
            mnemonic,
            field,
            value,
        };

        let x = || match value {
            Operand::Reg(Register::X(x)) => Ok(x),
            _ => Err(mismatch()),
        };
        let f = || match value {
            Operand::Reg(Register::F(f)) => Ok(f),
            _ => Err(mismatch()),
        };

        match (&mut self.operands, field) {
            (
                R { rd, .. } | I { rd, .. } | U { rd, .. } | J { rd, .. } | FToX { rd, .. },
                Field::Rd,
            ) => *rd = x()?,
            (
                R { rs1, .. } | I { rs1, .. } | S { rs1, .. } | B { rs1, .. } | XToF { rs1, .. },
                Field::Rs1,
            ) => *rs1 = x()?,
            (R { rs2, .. } | S { rs2, .. } | B { rs2, .. }, Field::Rs2) => *rs2 = x()?,
            (I { imm, .. } | U { imm, .. } | S { imm, .. }, Field::Imm) => match value {
                Operand::Imm(value) => *imm = value,
                Operand::Reg(_) => return Err(mismatch()),
            },
            (F { frd, .. } | XToF { frd, .. }, Field::Frd) => *frd = f()?,
            (F { frs1, .. } | FToX { frs1, .. }, Field::Frs1) => *frs1 = f()?,
            (
                F {
                    frs2: Some(frs2), ..
                }
                | FToX {
                    frs2: Some(frs2), ..
                },
                Field::Frs2,
            ) => *frs2 = f()?,
            (
                F {
                    frs3: Some(frs3), ..
                },
                Field::Frs3,
            ) => *frs3 = f()?,
            _ => return Err(FieldError::Absent { mnemonic, field }),
        }

        Ok(())
    }

    /// Control-flow target label, if this instruction has one.
    pub fn target(&self) -> Option<&str> {
        match &self.operands {
            Operands::B { target, .. } | Operands::J { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Replace the control-flow target label.
    pub fn set_target(&mut self, label: impl Into<String>) -> Result<(), FieldError> {
        match &mut self.operands {
            Operands::B { target, .. } | Operands::J { target, .. } => {
                *target = label.into();
                Ok(())
            }
            _ => Err(FieldError::NoTarget {
                mnemonic: self.mnemonic,
            }),
        }
    }

    /// Immediate value, if present.
    pub fn imm(&self) -> Option<i64> {
        match self.get(Field::Imm) {
            Some(Operand::Imm(imm)) => Some(imm),
            _ => None,
        }
    }

    /// Registers written by this instruction.
    pub fn destination(&self) -> Option<Register> {
        self.register(Field::Rd).or_else(|| self.register(Field::Frd))
    }

    /// Registers read by this instruction, in field order.
    pub fn sources(&self) -> impl Iterator<Item = Register> + '_ {
        Field::GPR_SOURCES
            .into_iter()
            .chain(Field::FPR_SOURCES)
            .filter_map(|field| self.register(field))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic;
        match &self.operands {
            Operands::R { rd, rs1, rs2 } => write!(f, "{m} {rd}, {rs1}, {rs2}"),
            Operands::I { rd, rs1, imm } => match m.format() {
                Format::Load | Format::Jalr => write!(f, "{m} {rd}, {imm}({rs1})"),
                _ => write!(f, "{m} {rd}, {rs1}, {imm}"),
            },
            Operands::U { rd, imm } => write!(f, "{m} {rd}, {imm}"),
            Operands::S { rs1, rs2, imm } => write!(f, "{m} {rs2}, {imm}({rs1})"),
            Operands::B { rs1, rs2, target } => write!(f, "{m} {rs1}, {rs2}, {target}"),
            Operands::J { rd, target } => write!(f, "{m} {rd}, {target}"),
            Operands::F {
                frd,
                frs1,
                frs2,
                frs3,
            } => {
                write!(f, "{m} {frd}, {frs1}")?;
                if let Some(frs2) = frs2 {
                    write!(f, ", {frs2}")?;
                }
                if let Some(frs3) = frs3 {
                    write!(f, ", {frs3}")?;
                }
                Ok(())
            }
            Operands::FToX { rd, frs1, frs2 } => {
                write!(f, "{m} {rd}, {frs1}")?;
                if let Some(frs2) = frs2 {
                    write!(f, ", {frs2}")?;
                }
                Ok(())
            }
            Operands::XToF { frd, rs1 } => write!(f, "{m} {frd}, {rs1}"),
        }
    }
}

/// One line of generated assembly: either a structured instruction or literal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AsmLine {
    Instr(Instruction),
    Raw(String),
}

impl AsmLine {
    pub fn raw(text: impl Into<String>) -> Self {
        AsmLine::Raw(text.into())
    }

    /// Literal lines never report fields.
    pub fn has(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    pub fn get(&self, field: Field) -> Option<Operand> {
        match self {
            AsmLine::Instr(instr) => instr.get(field),
            AsmLine::Raw(_) => None,
        }
    }

    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            AsmLine::Instr(instr) => Some(instr),
            AsmLine::Raw(_) => None,
        }
    }
}

impl From<Instruction> for AsmLine {
    fn from(instr: Instruction) -> Self {
        AsmLine::Instr(instr)
    }
}

impl fmt::Display for AsmLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmLine::Instr(instr) => instr.fmt(f),
            AsmLine::Raw(text) => f.write_str(text),
        }
    }
}
