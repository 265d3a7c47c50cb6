// ==========================================
// CSV 导入向导 - 进度页
// ==========================================
// 处理任务由向导启动，结果经票据校验后提交到本页
// 结束（成功或失败）后不自动跳转，需用户显式关闭或重新开始
// 关闭/重新开始各只能触发一次
// ==========================================

use crate::domain::types::{ImportInfo, PreviewInfo};
use crate::i18n::{Translation, TranslationKey};
use crate::importer::error::ImportResult;
use crate::importer::oplock::{OpLock, OpTicket};
use crate::importer::progress::ProgressEstimator;
use crate::wizard::frame::{FrameView, ImporterFrame};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ProgressOutcome {
    Running,
    Succeeded,
    Failed(String),
}

/// 进度页结束后的可用操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissAction {
    Close,
    Restart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub status: String,
    pub processed_label: String,
    pub processed_rows: usize,
    pub estimated_rows: f64,
    pub percentage: f64,
    pub outcome: ProgressOutcome,
    pub dismissed: bool,
}

#[derive(Debug)]
pub struct ProgressDisplay {
    info: ImportInfo,
    estimator: ProgressEstimator,
    outcome: ProgressOutcome,
    dismissed: bool,
    oplock: OpLock,
    restartable: bool,
    closable: bool,
}

impl ProgressDisplay {
    pub fn new(preview: &PreviewInfo, info: ImportInfo, restartable: bool, closable: bool) -> Self {
        let estimator = ProgressEstimator::new(&preview.first_rows, preview.file.size());
        debug!(
            file = %info.file.name(),
            estimated_rows = estimator.estimated_rows(),
            "进度页初始化"
        );
        Self {
            info,
            estimator,
            outcome: ProgressOutcome::Running,
            dismissed: false,
            oplock: OpLock::new(),
            restartable,
            closable,
        }
    }

    pub fn info(&self) -> &ImportInfo {
        &self.info
    }

    pub fn outcome(&self) -> &ProgressOutcome {
        &self.outcome
    }

    pub fn ticket(&self) -> OpTicket {
        self.oplock.ticket()
    }

    pub fn unmount(&self) {
        self.oplock.invalidate();
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.outcome, ProgressOutcome::Running)
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self.outcome, ProgressOutcome::Succeeded)
    }

    pub fn processed_rows(&self) -> usize {
        self.estimator.processed_rows()
    }

    pub fn percentage(&self) -> f64 {
        self.estimator.percentage(self.is_succeeded())
    }

    /// 累加一个分块的行数
    pub fn add_progress(&mut self, ticket: &OpTicket, delta: usize) -> bool {
        if !ticket.is_current() || self.is_finished() {
            debug!(delta, "丢弃过期的进度");
            return false;
        }
        self.estimator.add(delta);
        true
    }

    /// 提交处理结果
    ///
    /// # 返回
    /// - true: 已应用（每次挂载至多一次）
    pub fn finish(&mut self, ticket: &OpTicket, result: ImportResult<()>) -> bool {
        if !ticket.is_current() || self.is_finished() {
            debug!("丢弃过期的处理结果");
            return false;
        }
        self.outcome = match result {
            Ok(()) => {
                info!(
                    file = %self.info.file.name(),
                    rows = self.processed_rows(),
                    "导入完成"
                );
                ProgressOutcome::Succeeded
            }
            Err(e) => {
                warn!(file = %self.info.file.name(), error = %e, "导入失败");
                ProgressOutcome::Failed(e.to_string())
            }
        };
        true
    }

    pub fn can_close(&self) -> bool {
        self.closable && self.is_succeeded() && !self.dismissed
    }

    pub fn can_restart(&self) -> bool {
        self.restartable && self.is_finished() && !self.dismissed
    }

    /// "下一步"按钮对应的操作
    pub fn next_action(&self) -> Option<DismissAction> {
        if self.can_close() {
            Some(DismissAction::Close)
        } else if self.can_restart() {
            Some(DismissAction::Restart)
        } else {
            None
        }
    }

    /// 次要按钮仅在关闭与重新开始同时可用时出现
    pub fn secondary_action(&self) -> Option<DismissAction> {
        if self.closable && self.can_restart() {
            Some(DismissAction::Restart)
        } else {
            None
        }
    }

    /// 一次性关闭守卫，第二次调用返回 false
    pub fn dismiss(&mut self) -> bool {
        if self.dismissed {
            return false;
        }
        self.dismissed = true;
        true
    }

    pub fn view(&self, translation: &Translation) -> ProgressView {
        let status = match &self.outcome {
            ProgressOutcome::Running => {
                format!("{}...", translation.get(TranslationKey::Importing))
            }
            ProgressOutcome::Succeeded => translation.get(TranslationKey::Complete),
            ProgressOutcome::Failed(_) => translation.get(TranslationKey::CouldNotImport),
        };

        ProgressView {
            status,
            processed_label: translation.get(TranslationKey::ProcessedRows),
            processed_rows: self.processed_rows(),
            estimated_rows: self.estimator.estimated_rows(),
            percentage: self.percentage(),
            outcome: self.outcome.clone(),
            dismissed: self.dismissed,
        }
    }

    pub fn frame(&self, translation: &Translation) -> FrameView {
        let next_label = match self.next_action() {
            Some(DismissAction::Restart) => translation.get(TranslationKey::UploadMore),
            Some(DismissAction::Close) => translation.get(TranslationKey::Finish),
            None if !self.closable && self.restartable => {
                translation.get(TranslationKey::UploadMore)
            }
            None => translation.get(TranslationKey::Finish),
        };
        let error = match &self.outcome {
            ProgressOutcome::Failed(message) => Some(message.clone()),
            _ => None,
        };

        let mut frame = ImporterFrame::new(self.info.file.name(), translation)
            .subtitle(translation.get(TranslationKey::Import))
            .next(self.next_action().is_some())
            .next_label(next_label)
            .error(error);
        if self.closable && self.restartable {
            frame = frame.secondary(
                translation.get(TranslationKey::UploadMore),
                self.secondary_action().is_some(),
            );
        }
        frame.build()
    }
}
