// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Constraint descriptors for instruction selection
//!
//! Constraints are plain data so that a request can be logged, serialised into an error report
//! and checked against a candidate instruction independently of any particular selector.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

use serde::Deserialize;
use serde::Serialize;

use crate::isa::Category;
use crate::isa::Extension;
use crate::isa::Field;
use crate::isa::Instruction;
use crate::isa::Mnemonic;
use crate::isa::Operand;
use crate::isa::Register;

/// A predicate over the fields of a chosen instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "predicate", rename_all = "snake_case")]
pub enum Constraint {
    /// The field is populated.
    Uses { field: Field },

    /// The field is populated and holds `value`. Selectors should force the value.
    Equals { field: Field, value: Operand },

    /// At least one of the populated `fields` holds `value`.
    AnyEquals { fields: Vec<Field>, value: Operand },

    /// Every populated field among `fields` holds a register from `values`.
    Within {
        fields: Vec<Field>,
        values: Vec<Register>,
    },

    /// The mnemonic is none of `names`.
    NameNotIn { names: Vec<Mnemonic> },
}

impl Constraint {
    pub fn uses(field: Field) -> Self {
        Constraint::Uses { field }
    }

    pub fn equals(field: Field, value: impl Into<Operand>) -> Self {
        Constraint::Equals {
            field,
            value: value.into(),
        }
    }

    pub fn any_equals(fields: impl IntoIterator<Item = Field>, value: impl Into<Operand>) -> Self {
        Constraint::AnyEquals {
            fields: fields.into_iter().collect(),
            value: value.into(),
        }
    }

    pub fn within<R: Into<Register>>(
        fields: impl IntoIterator<Item = Field>,
        values: impl IntoIterator<Item = R>,
    ) -> Self {
        Constraint::Within {
            fields: fields.into_iter().collect(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name_not_in(names: impl IntoIterator<Item = Mnemonic>) -> Self {
        Constraint::NameNotIn {
            names: names.into_iter().collect(),
        }
    }

    /// Could an instruction with this mnemonic ever satisfy the constraint?
    pub fn admits(&self, mnemonic: Mnemonic) -> bool {
        let format = mnemonic.format();
        match self {
            Constraint::Uses { field } | Constraint::Equals { field, .. } => format.has(*field),
            Constraint::AnyEquals { fields, .. } => fields.iter().any(|f| format.has(*f)),
            Constraint::Within { .. } => true,
            Constraint::NameNotIn { names } => !names.contains(&mnemonic),
        }
    }

    /// Does the instruction satisfy the constraint?
    pub fn holds(&self, instr: &Instruction) -> bool {
        match self {
            Constraint::Uses { field } => instr.has(*field),
            Constraint::Equals { field, value } => instr.get(*field) == Some(*value),
            Constraint::AnyEquals { fields, value } => {
                fields.iter().any(|field| instr.get(*field) == Some(*value))
            }
            Constraint::Within { fields, values } => fields
                .iter()
                .filter_map(|field| instr.register(*field))
                .all(|reg| values.contains(&reg)),
            Constraint::NameNotIn { names } => !names.contains(&instr.mnemonic),
        }
    }
}

/// A complete selection request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    /// Allowed categories; `None` allows every category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<BTreeSet<Category>>,

    /// Allowed extensions. An empty set admits nothing.
    pub extensions: BTreeSet<Extension>,

    /// Allowed mnemonics; `None` allows every mnemonic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<BTreeSet<Mnemonic>>,

    /// Inclusive bounds on the immediate. Only instructions with an immediate qualify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imm_range: Option<(i64, i64)>,

    /// Allowed control-flow targets. Only instructions with a target qualify, and instructions
    /// with a target qualify only when this is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,

    /// Field predicates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Constraint>,
}

impl Constraints {
    pub fn new(extensions: impl IntoIterator<Item = Extension>) -> Self {
        Self {
            extensions: extensions.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    pub fn names(mut self, names: impl IntoIterator<Item = Mnemonic>) -> Self {
        self.names = Some(names.into_iter().collect());
        self
    }

    pub fn imm_range(mut self, range: RangeInclusive<i64>) -> Self {
        self.imm_range = Some((*range.start(), *range.end()));
        self
    }

    pub fn labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.fields.push(constraint);
        self
    }

    /// Immediate values both encodable by `mnemonic` and allowed by the request.
    pub fn imm_values(&self, mnemonic: Mnemonic) -> Option<RangeInclusive<i64>> {
        let encodable = mnemonic.format().imm_range()?;
        let (lo, hi) = self
            .imm_range
            .unwrap_or((*encodable.start(), *encodable.end()));
        let lo = lo.max(*encodable.start());
        let hi = hi.min(*encodable.end());
        (lo <= hi).then_some(lo..=hi)
    }

    /// Could an instruction with this mnemonic ever satisfy the request?
    pub fn admits(&self, mnemonic: Mnemonic) -> bool {
        let spec = mnemonic.spec();

        let category_ok = self
            .categories
            .as_ref()
            .is_none_or(|categories| categories.contains(&spec.category));
        let name_ok = self
            .names
            .as_ref()
            .is_none_or(|names| names.contains(&mnemonic));
        let imm_ok = self.imm_range.is_none() || self.imm_values(mnemonic).is_some();
        let label_ok = match &self.labels {
            Some(labels) => spec.format.has_label() && !labels.is_empty(),
            None => !spec.format.has_label(),
        };

        category_ok
            && name_ok
            && imm_ok
            && label_ok
            && self.extensions.contains(&spec.extension)
            && self.fields.iter().all(|c| c.admits(mnemonic))
    }

    /// Does the instruction satisfy every part of the request?
    pub fn holds(&self, instr: &Instruction) -> bool {
        let imm_ok = match (self.imm_range, instr.imm()) {
            (Some((lo, hi)), Some(imm)) => (lo..=hi).contains(&imm),
            (Some(_), None) => false,
            (None, _) => true,
        };
        let label_ok = match (&self.labels, instr.target()) {
            (Some(labels), Some(target)) => labels.iter().any(|l| l == target),
            (None, None) => true,
            _ => false,
        };

        self.admits(instr.mnemonic)
            && imm_ok
            && label_ok
            && self.fields.iter().all(|c| c.holds(instr))
    }
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::isa::FRegister;
    use crate::isa::XRegister;

    #[test]
    fn test_admits_scopes_by_category_and_extension() {
        let c = Constraints::new([Extension::RV_I]).categories([Category::Arithmetic]);
        assert!(c.admits(Mnemonic::Add));
        assert!(!c.admits(Mnemonic::Mul));
        assert!(!c.admits(Mnemonic::Beq));

        let none = Constraints::default();
        assert!(!none.admits(Mnemonic::Add));
    }

    #[test]
    fn test_labels_gate_control_flow() {
        let plain = Constraints::new([Extension::RV_I]);
        assert!(!plain.admits(Mnemonic::Beq));

        let labelled = plain.clone().labels(["func_end"]);
        assert!(labelled.admits(Mnemonic::Beq));
        assert!(!labelled.admits(Mnemonic::Add));
    }

    #[test]
    fn test_imm_values_intersect_encoding() {
        let c = Constraints::new([Extension::RV_I]).imm_range(0..=0);
        assert_eq!(c.imm_values(Mnemonic::Jalr), Some(0..=0));
        assert!(!c.admits(Mnemonic::Add));

        let c = Constraints::new([Extension::RV_I]).imm_range(100..=200);
        assert_eq!(c.imm_values(Mnemonic::Slli), None);
        assert!(!c.admits(Mnemonic::Slli));
    }

    #[test]
    fn test_field_predicates() {
        let instr = Instruction::r_type(Mnemonic::Add, XRegister::s1, XRegister::t2, XRegister::a0);

        assert!(Constraint::equals(Field::Rd, XRegister::s1).holds(&instr));
        assert!(Constraint::any_equals(Field::GPR_SOURCES, XRegister::a0).holds(&instr));
        assert!(!Constraint::within(Field::GPR_SOURCES, [XRegister::t2]).holds(&instr));
        assert!(Constraint::within([Field::Frs1], [FRegister::f0]).holds(&instr));
        assert!(!Constraint::name_not_in([Mnemonic::Add]).holds(&instr));
        assert!(!Constraint::uses(Field::Imm).holds(&instr));
    }

    #[test]
    fn test_display_is_json() {
        let c = Constraints::new([Extension::RV_I])
            .names([Mnemonic::Jalr])
            .with(Constraint::equals(Field::Rd, XRegister::ra));
        let rendered = c.to_string();
        let parsed: Constraints = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, c);
        assert!(rendered.contains("\"jalr\""));
    }
}
