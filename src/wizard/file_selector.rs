// ==========================================
// CSV 导入向导 - 文件选择页
// ==========================================
// 拖放 / 点击两条入口，均受 FilePickerOptions 约束
// 空投放静默忽略；多文件时取第一个被接受的文件
// ==========================================

use crate::config::FilePickerOptions;
use crate::domain::file::ImportFile;
use crate::i18n::{Translation, TranslationKey};
use crate::importer::error::{ImportError, ImportResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedFile {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct DropOutcome {
    pub accepted: Option<Arc<dyn ImportFile>>,
    pub rejected: Vec<RejectedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSelectorView {
    pub label: String,
    pub drag_active: bool,
    pub click_enabled: bool,
    pub drag_enabled: bool,
    /// 最近一次投放被拒绝的文件
    pub rejected: Vec<RejectedFile>,
}

#[derive(Debug, Clone)]
pub struct FileSelector {
    options: FilePickerOptions,
    drag_active: bool,
    rejected: Vec<RejectedFile>,
}

impl FileSelector {
    pub fn new(options: FilePickerOptions) -> Self {
        Self {
            options,
            drag_active: false,
            rejected: Vec::new(),
        }
    }

    pub fn options(&self) -> &FilePickerOptions {
        &self.options
    }

    pub fn set_drag_active(&mut self, active: bool) -> ImportResult<()> {
        if active && self.options.no_drag {
            return Err(ImportError::ActionDisabled("拖放已禁用".to_string()));
        }
        self.drag_active = active;
        Ok(())
    }

    /// 检查单个文件是否可接受
    ///
    /// # 返回
    /// - Err(FileRejected): 类型或大小不符
    pub fn check(&self, file: &dyn ImportFile) -> ImportResult<()> {
        if !self
            .options
            .accepts_type(file.name(), file.content_type())
        {
            return Err(ImportError::FileRejected {
                file: file.name().to_string(),
                reason: format!("不接受的文件类型，允许: {}", self.options.accept.join(", ")),
            });
        }
        if let Some(reason) = self.options.check_size(file.size()) {
            return Err(ImportError::FileRejected {
                file: file.name().to_string(),
                reason,
            });
        }
        Ok(())
    }

    /// 拖放入口
    pub fn drop_files(&mut self, files: Vec<Arc<dyn ImportFile>>) -> ImportResult<DropOutcome> {
        if self.options.no_drag {
            return Err(ImportError::ActionDisabled("拖放已禁用".to_string()));
        }
        self.drag_active = false;
        Ok(self.classify(files))
    }

    /// 点击选择入口
    pub fn pick_files(&mut self, files: Vec<Arc<dyn ImportFile>>) -> ImportResult<DropOutcome> {
        if self.options.no_click {
            return Err(ImportError::ActionDisabled("点击选择已禁用".to_string()));
        }
        Ok(self.classify(files))
    }

    fn classify(&mut self, files: Vec<Arc<dyn ImportFile>>) -> DropOutcome {
        if files.is_empty() {
            debug!("空投放，忽略");
            return DropOutcome::default();
        }

        let mut outcome = DropOutcome::default();
        for file in files {
            match self.check(file.as_ref()) {
                Ok(()) if outcome.accepted.is_none() => outcome.accepted = Some(file),
                Ok(()) => debug!(file = %file.name(), "已有文件被接受，忽略后续文件"),
                Err(ImportError::FileRejected { file, reason }) => {
                    outcome.rejected.push(RejectedFile { name: file, reason })
                }
                Err(e) => outcome.rejected.push(RejectedFile {
                    name: file.name().to_string(),
                    reason: e.to_string(),
                }),
            }
        }

        info!(
            accepted = ?outcome.accepted.as_ref().map(|f| f.name().to_string()),
            rejected = outcome.rejected.len(),
            "文件投放处理完成"
        );
        self.rejected = outcome.rejected.clone();
        outcome
    }

    pub fn view(&self, translation: &Translation) -> FileSelectorView {
        let label = if self.drag_active {
            format!("{}...", translation.get(TranslationKey::DropCsvFilesHere))
        } else {
            translation.get(TranslationKey::DropCsvFilesHereOrClick)
        };

        FileSelectorView {
            label,
            drag_active: self.drag_active,
            click_enabled: !self.options.no_click,
            drag_enabled: !self.options.no_drag,
            rejected: self.rejected.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::file::MemoryFile;

    fn file(name: &str, text: &str) -> Arc<dyn ImportFile> {
        Arc::new(MemoryFile::from_text(name, text))
    }

    #[test]
    fn test_empty_drop_ignored() {
        let mut selector = FileSelector::new(FilePickerOptions::default());
        let outcome = selector.drop_files(Vec::new()).unwrap();
        assert!(outcome.accepted.is_none());
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_first_accepted_file_wins() {
        let mut selector = FileSelector::new(FilePickerOptions::default());
        let outcome = selector
            .drop_files(vec![
                file("report.xlsx", "x"),
                file("a.csv", "a\n1\n"),
                file("b.csv", "b\n2\n"),
            ])
            .unwrap();

        assert_eq!(outcome.accepted.unwrap().name(), "a.csv");
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].name, "report.xlsx");
        assert_eq!(selector.view(&Translation::new()).rejected.len(), 1);
    }

    #[test]
    fn test_size_limits() {
        let mut selector = FileSelector::new(FilePickerOptions {
            max_size: Some(4),
            ..FilePickerOptions::default()
        });
        let outcome = selector.pick_files(vec![file("big.csv", "a,b,c\n")]).unwrap();
        assert!(outcome.accepted.is_none());
        assert!(outcome.rejected[0].reason.contains("过大"));
    }

    #[test]
    fn test_disabled_entry_points() {
        let mut selector = FileSelector::new(FilePickerOptions {
            no_click: true,
            no_drag: true,
            ..FilePickerOptions::default()
        });
        assert!(selector.pick_files(vec![file("a.csv", "a")]).is_err());
        assert!(selector.drop_files(vec![file("a.csv", "a")]).is_err());
        assert!(selector.set_drag_active(true).is_err());

        let view = selector.view(&Translation::new());
        assert!(!view.click_enabled);
        assert!(!view.drag_enabled);
    }

    #[test]
    fn test_label_follows_drag_state() {
        let mut translation = Translation::new();
        translation.set(TranslationKey::DropCsvFilesHere, "Drop");
        translation.set(TranslationKey::DropCsvFilesHereOrClick, "Drop or click");

        let mut selector = FileSelector::new(FilePickerOptions::default());
        assert_eq!(selector.view(&translation).label, "Drop or click");

        selector.set_drag_active(true).unwrap();
        assert_eq!(selector.view(&translation).label, "Drop...");

        // 投放结束后拖放状态复位
        selector.drop_files(vec![file("a.csv", "a")]).unwrap();
        assert!(!selector.view(&translation).drag_active);
    }
}
