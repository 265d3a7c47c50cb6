// ==========================================
// CSV 导入向导 - 领域类型
// ==========================================
// 包含: 字段描述 / 预览信息 / 列投影 / 导入信息
// ==========================================

use crate::domain::file::ImportFile;
use crate::importer::column_assignment::FieldAssignmentMap;
use crate::importer::error::ParseWarning;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// 一行导入结果: 字段名 → 单元格文本
pub type BaseRow = HashMap<String, String>;

/// 分块回调附带的位置信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    /// 本块第一行在全部数据行中的序号（从 0 开始，不含表头）
    pub start_index: usize,
}

// ==========================================
// 字段描述（由宿主声明）
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// 字段名（唯一）
    pub name: String,
    /// 展示文本
    pub label: String,
    /// 是否可选
    #[serde(default)]
    pub is_optional: bool,
}

impl FieldDescriptor {
    pub fn required(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            is_optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            is_optional: true,
        }
    }
}

/// 字段列表，保持声明顺序
///
/// 同名字段再次声明时原位替换，不改变其位置。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldList {
    fields: Vec<FieldDescriptor>,
}

impl FieldList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增或原位替换字段
    pub fn upsert(&mut self, field: FieldDescriptor) {
        match self.fields.iter().position(|f| f.name == field.name) {
            Some(idx) => self.fields[idx] = field,
            None => self.fields.push(field),
        }
    }

    /// 移除字段，返回是否存在
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.name != name);
        self.fields.len() != before
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 必填字段名
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| !f.is_optional)
            .map(|f| f.name.as_str())
    }
}

impl FromIterator<FieldDescriptor> for FieldList {
    fn from_iter<I: IntoIterator<Item = FieldDescriptor>>(iter: I) -> Self {
        let mut list = FieldList::new();
        for field in iter {
            list.upsert(field);
        }
        list
    }
}

impl From<Vec<FieldDescriptor>> for FieldList {
    fn from(fields: Vec<FieldDescriptor>) -> Self {
        fields.into_iter().collect()
    }
}

// ==========================================
// 预览信息
// ==========================================

/// 文件前缀的解析结果
///
/// 每次选择文件由预览解析器创建一次；之后只有 has_headers 可被用户切换。
#[derive(Debug, Clone)]
pub struct PreviewInfo {
    pub file: Arc<dyn ImportFile>,
    pub has_headers: bool,
    /// 原始文本样本
    pub first_chunk: String,
    pub first_rows: Vec<Vec<String>>,
    pub is_single_line: bool,
    pub parse_warning: Option<ParseWarning>,
    /// 探测到的分隔符
    pub delimiter: u8,
}

impl PreviewInfo {
    /// 按规则预置表头标志: 单行文件永远为 false
    pub fn seed_has_headers(&mut self, assume_no_headers: bool) {
        self.has_headers = !assume_no_headers && !self.is_single_line;
    }

    pub fn header_row(&self) -> Option<&[String]> {
        if self.has_headers {
            self.first_rows.first().map(|row| row.as_slice())
        } else {
            None
        }
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        let skip = usize::from(self.has_headers).min(self.first_rows.len());
        &self.first_rows[skip..]
    }
}

// ==========================================
// 列投影
// ==========================================

/// 预览行在某一列位置上的只读投影
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub index: usize,
    pub header: Option<String>,
    /// 表格式列代号（A, B, ..., AA）
    pub code: String,
    pub values: Vec<String>,
}

/// 列序号 → 表格式代号
pub fn column_code(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 从预览派生列（以首行宽度为准）
pub fn derive_columns(preview: &PreviewInfo) -> Vec<Column> {
    let first_row = match preview.first_rows.first() {
        Some(row) => row,
        None => return Vec::new(),
    };

    (0..first_row.len())
        .map(|index| Column {
            index,
            header: if preview.has_headers {
                Some(first_row[index].clone())
            } else {
                None
            },
            code: column_code(index),
            values: preview
                .data_rows()
                .iter()
                .map(|row| row.get(index).cloned().unwrap_or_default())
                .collect(),
        })
        .collect()
}

// ==========================================
// 导入信息（生命周期回调参数）
// ==========================================

#[derive(Debug, Clone)]
pub struct ImportInfo {
    pub file: Arc<dyn ImportFile>,
    /// 已分配字段，按字段列表顺序
    pub fields: Vec<String>,
}

impl ImportInfo {
    pub fn new(
        file: Arc<dyn ImportFile>,
        fields: &FieldList,
        assignments: &FieldAssignmentMap,
    ) -> Self {
        let fields = fields
            .iter()
            .filter(|f| assignments.column_of(&f.name).is_some())
            .map(|f| f.name.clone())
            .collect();
        Self { file, fields }
    }
}
