// ==========================================
// CSV 导入向导 - 列分配页
// ==========================================
// 源区: 预览派生的列，按页展示（每页 SOURCES_PAGE_SIZE 列）
// 目标区: 宿主字段列表
// 交互: 指针拖放（开始 → 悬停 → 放下/取消）或键盘选择后点字段分配
// ==========================================

use crate::domain::types::{column_code, derive_columns, Column, FieldList, PreviewInfo};
use crate::i18n::{Translation, TranslationKey};
use crate::importer::column_assignment::FieldAssignmentMap;
use crate::importer::error::{ImportError, ImportResult};
use crate::wizard::frame::{FrameView, ImporterFrame};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// 每页源列数
pub const SOURCES_PAGE_SIZE: usize = 5;

/// 拖动 / 选择状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragState {
    pub column: usize,
    /// 指针起点；None 表示键盘选择
    pub pointer_start: Option<(f64, f64)>,
    /// 当前悬停的目标字段
    pub hover_field: Option<String>,
}

impl DragState {
    pub fn is_pointer(&self) -> bool {
        self.pointer_start.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceColumnView {
    pub index: usize,
    pub code: String,
    /// 表头或 "Column A"
    pub title: String,
    pub values: Vec<String>,
    pub assigned: bool,
    pub dragged: bool,
    pub draggable: bool,
    /// 已分配时为清除，否则为选择/取消选择
    pub action_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFieldView {
    pub name: String,
    pub label: String,
    pub is_optional: bool,
    pub assigned_column: Option<usize>,
    /// 已分配列的标题，未分配时为 "Unassigned field"
    pub status: String,
    pub hovered: bool,
    /// 未分配时的放置提示
    pub placeholder: Option<String>,
    /// 存在选中列时可点击分配
    pub assign_label: Option<String>,
    pub clear_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnPickerView {
    pub sources: Vec<SourceColumnView>,
    pub page: usize,
    pub page_count: usize,
    /// "Page 1 of 3" 或 "Assigning column B"
    pub page_indicator: Option<String>,
    pub prev_page_enabled: bool,
    pub next_page_enabled: bool,
    pub prev_page_label: String,
    pub next_page_label: String,
    pub targets: Vec<TargetFieldView>,
    pub drag: Option<DragState>,
}

#[derive(Debug, Clone)]
pub struct ColumnPicker {
    file_name: String,
    has_headers: bool,
    fields: FieldList,
    columns: Arc<[Column]>,
    assignments: FieldAssignmentMap,
    drag: Option<DragState>,
    page: usize,
    validation_error: bool,
}

impl ColumnPicker {
    pub fn new(fields: FieldList, preview: &PreviewInfo) -> Self {
        let columns: Arc<[Column]> = derive_columns(preview).into();
        debug!(columns = columns.len(), fields = fields.len(), "列分配页初始化");
        Self {
            file_name: preview.file.name().to_string(),
            has_headers: preview.has_headers,
            fields,
            columns,
            assignments: FieldAssignmentMap::new(),
            drag: None,
            page: 0,
            validation_error: false,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn assignments(&self) -> &FieldAssignmentMap {
        &self.assignments
    }

    pub fn drag_state(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        (self.columns.len() + SOURCES_PAGE_SIZE - 1) / SOURCES_PAGE_SIZE
    }

    /// 宿主字段列表变化: 删除已不存在字段的分配
    pub fn set_fields(&mut self, fields: FieldList) {
        let stale: Vec<String> = self
            .assignments
            .iter()
            .filter(|(name, _)| !fields.contains(name))
            .map(|(name, _)| name.to_string())
            .collect();
        for name in stale {
            self.assignments.unassign_field(&name);
        }
        if let Some(drag) = &mut self.drag {
            if drag.hover_field.as_deref().map(|f| !fields.contains(f)).unwrap_or(false) {
                drag.hover_field = None;
            }
        }
        self.fields = fields;
    }

    fn check_column(&self, column: usize) -> ImportResult<()> {
        if column >= self.columns.len() {
            return Err(ImportError::ColumnOutOfRange {
                index: column,
                count: self.columns.len(),
            });
        }
        Ok(())
    }

    fn check_field(&self, field: &str) -> ImportResult<()> {
        if !self.fields.contains(field) {
            return Err(ImportError::UnknownField(field.to_string()));
        }
        Ok(())
    }

    // ===== 键盘选择 =====

    /// 选择列用于分配；再次选择同一列则取消
    pub fn select_column(&mut self, column: usize) -> ImportResult<()> {
        self.check_column(column)?;
        if self.assignments.is_column_assigned(column) {
            return Err(ImportError::ActionDisabled("列已分配，请先清除".to_string()));
        }

        match self.drag.as_ref().map(|d| (d.column, d.is_pointer())) {
            Some((_, true)) => Err(ImportError::ActionDisabled("拖动进行中".to_string())),
            Some((selected, false)) if selected == column => {
                self.drag = None;
                Ok(())
            }
            _ => {
                self.drag = Some(DragState {
                    column,
                    pointer_start: None,
                    hover_field: None,
                });
                Ok(())
            }
        }
    }

    /// 把当前选中（或拖动中）的列分配给字段
    pub fn assign_selected(&mut self, field: &str) -> ImportResult<()> {
        self.check_field(field)?;
        let drag = self
            .drag
            .take()
            .ok_or_else(|| ImportError::ActionDisabled("没有选中的列".to_string()))?;
        self.assign(field, drag.column)
    }

    // ===== 指针拖放 =====

    pub fn start_drag(&mut self, column: usize, pointer: (f64, f64)) -> ImportResult<()> {
        self.check_column(column)?;
        if self.assignments.is_column_assigned(column) {
            return Err(ImportError::ActionDisabled("列已分配，请先清除".to_string()));
        }
        if self.drag.as_ref().map(DragState::is_pointer).unwrap_or(false) {
            return Err(ImportError::ActionDisabled("拖动进行中".to_string()));
        }
        self.drag = Some(DragState {
            column,
            pointer_start: Some(pointer),
            hover_field: None,
        });
        Ok(())
    }

    /// 指针移入/移出目标字段
    pub fn hover_field(&mut self, field: Option<&str>) -> ImportResult<()> {
        if let Some(name) = field {
            self.check_field(name)?;
        }
        match &mut self.drag {
            Some(drag) if drag.is_pointer() => {
                drag.hover_field = field.map(str::to_string);
                Ok(())
            }
            _ => Err(ImportError::ActionDisabled("没有进行中的拖动".to_string())),
        }
    }

    /// 放下: 悬停在字段上则分配，否则等同取消
    ///
    /// # 返回
    /// - Some(field): 被分配的字段
    pub fn drop_column(&mut self) -> ImportResult<Option<String>> {
        let drag = match self.drag.take() {
            Some(drag) if drag.is_pointer() => drag,
            other => {
                self.drag = other;
                return Err(ImportError::ActionDisabled("没有进行中的拖动".to_string()));
            }
        };

        match drag.hover_field {
            Some(field) => {
                self.assign(&field, drag.column)?;
                Ok(Some(field))
            }
            None => Ok(None),
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    // ===== 直接分配 / 清除 =====

    pub fn assign(&mut self, field: &str, column: usize) -> ImportResult<()> {
        self.check_field(field)?;
        self.check_column(column)?;

        if let Some(evicted) = self.assignments.assign(field, column) {
            debug!(field, column, evicted = %evicted, "列改归新字段");
        }
        if self.drag.as_ref().map(|d| d.column == column).unwrap_or(false) {
            self.drag = None;
        }
        self.validation_error = false;
        Ok(())
    }

    pub fn clear_column(&mut self, column: usize) -> ImportResult<()> {
        self.check_column(column)?;
        self.assignments.unassign(column);
        self.validation_error = false;
        Ok(())
    }

    pub fn clear_field(&mut self, field: &str) -> ImportResult<()> {
        self.check_field(field)?;
        self.assignments.unassign_field(field);
        self.validation_error = false;
        Ok(())
    }

    // ===== 翻页 =====

    pub fn next_page(&mut self) -> bool {
        if self.page + 1 < self.page_count() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page > 0 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    // ===== 确认 =====

    pub fn is_ready(&self) -> bool {
        self.assignments.is_ready(&self.fields)
    }

    /// 确认分配；必填字段未全部分配时置位校验错误
    pub fn accept(&mut self) -> ImportResult<FieldAssignmentMap> {
        let missing = self.assignments.missing_required(&self.fields);
        if !missing.is_empty() {
            let message = format!("必填字段未分配: {}", missing.join(", "));
            self.validation_error = true;
            info!(missing = ?missing, "列分配未完成");
            return Err(ImportError::ActionDisabled(message));
        }
        self.validation_error = false;
        Ok(self.assignments.clone())
    }

    fn column_title(&self, column: &Column, translation: &Translation) -> String {
        match (&column.header, self.has_headers) {
            (Some(header), true) => header.clone(),
            _ => format!("{} {}", translation.get(TranslationKey::Column), column.code),
        }
    }

    pub fn view(&self, translation: &Translation) -> ColumnPickerView {
        let start = self.page * SOURCES_PAGE_SIZE;
        let sources = self
            .columns
            .iter()
            .skip(start)
            .take(SOURCES_PAGE_SIZE)
            .map(|column| {
                let assigned = self.assignments.is_column_assigned(column.index);
                let dragged = self
                    .drag
                    .as_ref()
                    .map(|d| d.column == column.index)
                    .unwrap_or(false);
                let action_label = if assigned {
                    translation.get(TranslationKey::ClearColumnAssignment)
                } else if dragged {
                    translation.get(TranslationKey::UnselectColumn)
                } else {
                    translation.get(TranslationKey::SelectColumnForAssignment)
                };
                SourceColumnView {
                    index: column.index,
                    code: column.code.clone(),
                    title: self.column_title(column, translation),
                    values: column.values.clone(),
                    assigned,
                    dragged,
                    draggable: self.drag.is_none() && !assigned,
                    action_label,
                }
            })
            .collect();

        let page_count = self.page_count();
        let page_indicator = match &self.drag {
            Some(drag) if !drag.is_pointer() => Some(format!(
                "{} {}",
                translation.get(TranslationKey::AssigningColumns),
                column_code(drag.column)
            )),
            _ if page_count > 1 => Some(format!(
                "{} {} {} {}",
                translation.get(TranslationKey::Page),
                self.page + 1,
                translation.get(TranslationKey::Of),
                page_count
            )),
            _ => None,
        };

        let targets = self
            .fields
            .iter()
            .map(|field| {
                let assigned_column = self.assignments.column_of(&field.name);
                let status = match assigned_column.and_then(|idx| self.columns.get(idx)) {
                    Some(column) => self.column_title(column, translation),
                    None => translation.get(TranslationKey::UnassignedFields),
                };
                TargetFieldView {
                    name: field.name.clone(),
                    label: field.label.clone(),
                    is_optional: field.is_optional,
                    assigned_column,
                    status,
                    hovered: self
                        .drag
                        .as_ref()
                        .and_then(|d| d.hover_field.as_deref())
                        == Some(field.name.as_str()),
                    placeholder: assigned_column
                        .is_none()
                        .then(|| translation.get(TranslationKey::DragColumnHere)),
                    assign_label: self
                        .drag
                        .is_some()
                        .then(|| translation.get(TranslationKey::AssignColumn)),
                    clear_label: assigned_column
                        .map(|_| translation.get(TranslationKey::ClearColumnAssignment)),
                }
            })
            .collect();

        ColumnPickerView {
            sources,
            page: self.page,
            page_count,
            page_indicator,
            prev_page_enabled: self.page > 0,
            next_page_enabled: self.page + 1 < page_count,
            prev_page_label: translation.get(TranslationKey::ShowPreviousColumns),
            next_page_label: translation.get(TranslationKey::ShowNextColumns),
            targets,
            drag: self.drag.clone(),
        }
    }

    pub fn frame(&self, translation: &Translation) -> FrameView {
        let error = self
            .validation_error
            .then(|| translation.get(TranslationKey::AssignAllRequiredFields));
        ImporterFrame::new(self.file_name.as_str(), translation)
            .subtitle(translation.get(TranslationKey::SelectColumns))
            .back(true)
            .next(true)
            .error(error)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::file::MemoryFile;
    use crate::domain::types::FieldDescriptor;

    fn preview(width: usize, has_headers: bool) -> PreviewInfo {
        let header: Vec<String> = (0..width).map(|i| format!("h{}", i)).collect();
        let row: Vec<String> = (0..width).map(|i| format!("v{}", i)).collect();
        PreviewInfo {
            file: Arc::new(MemoryFile::from_text("data.csv", "")),
            has_headers,
            first_chunk: String::new(),
            first_rows: vec![header, row],
            is_single_line: false,
            parse_warning: None,
            delimiter: b',',
        }
    }

    fn fields() -> FieldList {
        FieldList::from(vec![
            FieldDescriptor::required("f1", "Field 1"),
            FieldDescriptor::optional("f2", "Field 2"),
        ])
    }

    #[test]
    fn test_ready_depends_on_required_only() {
        let mut picker = ColumnPicker::new(fields(), &preview(3, true));
        assert!(!picker.is_ready());

        picker.assign("f2", 1).unwrap();
        assert!(!picker.is_ready());
        assert!(picker.accept().is_err());
        assert!(picker.frame(&Translation::new()).error.is_some());

        picker.assign("f1", 0).unwrap();
        assert!(picker.is_ready());
        // 分配变化后校验提示清除
        assert!(picker.frame(&Translation::new()).error.is_none());

        let accepted = picker.accept().unwrap();
        assert_eq!(accepted.column_of("f1"), Some(0));
        assert_eq!(accepted.column_of("f2"), Some(1));
    }

    #[test]
    fn test_keyboard_select_and_assign() {
        let mut picker = ColumnPicker::new(fields(), &preview(3, true));
        picker.select_column(2).unwrap();
        assert_eq!(picker.drag_state().unwrap().column, 2);

        let mut translation = Translation::new();
        translation.set(TranslationKey::AssigningColumns, "Assigning");
        let view = picker.view(&translation);
        assert_eq!(view.page_indicator.as_deref(), Some("Assigning C"));
        assert!(view.targets.iter().all(|t| t.assign_label.is_some()));

        picker.assign_selected("f1").unwrap();
        assert!(picker.drag_state().is_none());
        assert_eq!(picker.assignments().column_of("f1"), Some(2));

        // 已分配的列不可再选
        assert!(picker.select_column(2).is_err());
        assert!(picker.assign_selected("f2").is_err());
    }

    #[test]
    fn test_select_same_column_toggles() {
        let mut picker = ColumnPicker::new(fields(), &preview(3, true));
        picker.select_column(1).unwrap();
        picker.select_column(1).unwrap();
        assert!(picker.drag_state().is_none());
    }

    #[test]
    fn test_pointer_drag_drop() {
        let mut picker = ColumnPicker::new(fields(), &preview(3, true));
        picker.start_drag(0, (10.0, 20.0)).unwrap();
        assert!(picker.start_drag(1, (0.0, 0.0)).is_err());
        assert!(picker.hover_field(Some("nope")).is_err());

        picker.hover_field(Some("f1")).unwrap();
        let view = picker.view(&Translation::new());
        assert!(view.targets[0].hovered);
        // 指针拖动不显示键盘分配提示
        assert!(!view
            .page_indicator
            .unwrap_or_default()
            .contains(&Translation::new().get(TranslationKey::AssigningColumns)));

        assert_eq!(picker.drop_column().unwrap().as_deref(), Some("f1"));
        assert_eq!(picker.assignments().column_of("f1"), Some(0));
        assert!(picker.drop_column().is_err());
    }

    #[test]
    fn test_drop_outside_cancels() {
        let mut picker = ColumnPicker::new(fields(), &preview(3, true));
        picker.start_drag(1, (0.0, 0.0)).unwrap();
        picker.hover_field(Some("f2")).unwrap();
        picker.hover_field(None).unwrap();
        assert_eq!(picker.drop_column().unwrap(), None);
        assert!(picker.assignments().is_empty());

        picker.start_drag(1, (0.0, 0.0)).unwrap();
        picker.cancel_drag();
        assert!(picker.drag_state().is_none());
    }

    #[test]
    fn test_reassign_column_evicts_previous_owner() {
        let mut picker = ColumnPicker::new(fields(), &preview(3, true));
        picker.assign("f1", 0).unwrap();
        picker.assign("f2", 0).unwrap();
        assert_eq!(picker.assignments().column_of("f1"), None);
        assert_eq!(picker.assignments().column_of("f2"), Some(0));

        picker.clear_column(0).unwrap();
        assert!(picker.assignments().is_empty());
        picker.assign("f1", 1).unwrap();
        picker.clear_field("f1").unwrap();
        assert!(picker.assignments().is_empty());
    }

    #[test]
    fn test_bounds_and_unknown_fields() {
        let mut picker = ColumnPicker::new(fields(), &preview(2, true));
        assert!(matches!(
            picker.assign("f1", 5),
            Err(ImportError::ColumnOutOfRange { index: 5, count: 2 })
        ));
        assert!(matches!(
            picker.assign("zz", 0),
            Err(ImportError::UnknownField(_))
        ));
    }

    #[test]
    fn test_paging() {
        let mut picker = ColumnPicker::new(fields(), &preview(12, true));
        assert_eq!(picker.page_count(), 3);
        assert!(!picker.prev_page());

        let view = picker.view(&Translation::new());
        assert_eq!(view.sources.len(), SOURCES_PAGE_SIZE);
        assert!(!view.prev_page_enabled);
        assert!(view.next_page_enabled);

        assert!(picker.next_page());
        assert!(picker.next_page());
        assert!(!picker.next_page());

        let mut translation = Translation::new();
        translation.set(TranslationKey::Page, "Page");
        translation.set(TranslationKey::Of, "of");
        let view = picker.view(&translation);
        assert_eq!(view.sources.len(), 2);
        assert_eq!(view.sources[0].code, "K");
        assert_eq!(view.page_indicator.as_deref(), Some("Page 3 of 3"));
    }

    #[test]
    fn test_column_titles_without_headers() {
        let picker = ColumnPicker::new(fields(), &preview(2, false));
        let mut translation = Translation::new();
        translation.set(TranslationKey::Column, "Col");
        let view = picker.view(&translation);
        assert_eq!(view.sources[0].title, "Col A");
        // 无表头时两行都是数据
        assert_eq!(view.sources[0].values.len(), 2);
        assert!(view.page_indicator.is_none());
    }

    #[test]
    fn test_set_fields_drops_stale_assignments() {
        let mut picker = ColumnPicker::new(fields(), &preview(3, true));
        picker.assign("f2", 1).unwrap();
        picker.set_fields(FieldList::from(vec![FieldDescriptor::required("f1", "Field 1")]));
        assert!(picker.assignments().is_empty());
        assert_eq!(picker.view(&Translation::new()).targets.len(), 1);
    }
}
