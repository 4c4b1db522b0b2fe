// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! The slice of the RV64 instruction set the generator can emit

pub mod extension;
pub mod instruction;
pub mod registers;

pub use extension::Extension;
pub use instruction::AsmLine;
pub use instruction::Category;
pub use instruction::Field;
pub use instruction::Instruction;
pub use instruction::Mnemonic;
pub use instruction::Operand;
pub use registers::FRegister;
pub use registers::Register;
pub use registers::XRegister;
