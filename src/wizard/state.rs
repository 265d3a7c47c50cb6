// ==========================================
// CSV 导入向导 - 步骤与状态槽
// ==========================================
// 步骤不单独存储，由四个状态槽推导:
//   selected_file 为空       → SelectingFile
//   preview 为空或编辑格式中  → PreviewingFormat
//   field_assignments 为空   → AssigningColumns
//   其余                     → ShowingProgress
// ==========================================

use crate::domain::file::ImportFile;
use crate::domain::types::PreviewInfo;
use crate::importer::column_assignment::FieldAssignmentMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ==========================================
// WizardStep - 向导步骤
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectingFile,
    PreviewingFormat,
    AssigningColumns,
    ShowingProgress,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::SelectingFile => "selecting_file",
            WizardStep::PreviewingFormat => "previewing_format",
            WizardStep::AssigningColumns => "assigning_columns",
            WizardStep::ShowingProgress => "showing_progress",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// WizardSlots - 状态槽
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct WizardSlots {
    pub selected_file: Option<Arc<dyn ImportFile>>,
    /// 已确认的预览（含用户选择的表头标志）
    pub preview: Option<PreviewInfo>,
    /// 从列分配页返回格式页时置位，复用 preview 不重新解析
    pub edit_format: bool,
    /// 已确认的列分配
    pub field_assignments: Option<FieldAssignmentMap>,
}

impl WizardSlots {
    pub fn step(&self) -> WizardStep {
        if self.selected_file.is_none() {
            WizardStep::SelectingFile
        } else if self.preview.is_none() || self.edit_format {
            WizardStep::PreviewingFormat
        } else if self.field_assignments.is_none() {
            WizardStep::AssigningColumns
        } else {
            WizardStep::ShowingProgress
        }
    }

    /// 清空全部状态槽（重新开始）
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
