//! Classification outcome model

use std::collections::BTreeMap;

use crate::shared::models::NodeId;

/// Write status of one field offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    /// Every observed writer runs during initialization only
    Protect,
    /// At least one writer runs after initialization
    Written,
}

impl FieldStatus {
    pub fn label(self) -> &'static str {
        match self {
            FieldStatus::Protect => "Protect",
            FieldStatus::Written => "Written",
        }
    }
}

/// One classified field offset
#[derive(Debug, Clone, Copy)]
pub struct FieldClass {
    pub status: FieldStatus,
    /// Distinct nodes denoting this field
    pub alias_count: usize,
}

/// Per-variable classification, offsets ascending
#[derive(Debug, Clone)]
pub struct VariableClassification {
    pub target: NodeId,
    pub name: String,
    pub fields: BTreeMap<i64, FieldClass>,
}

impl VariableClassification {
    pub fn protectable_offsets(&self) -> Vec<i64> {
        self.fields
            .iter()
            .filter(|(_, f)| f.status == FieldStatus::Protect)
            .map(|(&off, _)| off)
            .collect()
    }

    pub fn total_fields(&self) -> usize {
        self.fields.len()
    }

    /// `protectable/total` as printed in both report formats.
    pub fn ratio(&self) -> String {
        format!(
            "{}/{}",
            self.protectable_offsets().len(),
            self.total_fields()
        )
    }
}
