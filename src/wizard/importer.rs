// ==========================================
// CSV 导入向导 - 向导编排器
// ==========================================
// 职责: 持有状态槽、挂载/卸载页面、分派用户操作、启动异步任务
// 并发: 状态在 std Mutex 中，临界区内不 await
//       回调与任务启动都在锁外进行（先派发事件，再启动任务）
// 依赖: 配置、字段列表、文案表、分块处理器、生命周期回调均显式注入
// ==========================================

use crate::config::ImporterConfig;
use crate::domain::file::ImportFile;
use crate::domain::types::{FieldDescriptor, FieldList, ImportInfo, PreviewInfo};
use crate::i18n::{self, Translation};
use crate::importer::chunk_processor::ChunkProcessor;
use crate::importer::column_assignment::FieldAssignmentMap;
use crate::importer::error::{ImportError, ImportResult, PreviewError};
use crate::importer::file_processor::process_file_with_delimiter;
use crate::importer::oplock::OpTicket;
use crate::importer::preview_parser::parse_preview;
use crate::wizard::column_picker::ColumnPicker;
use crate::wizard::events::{ImportCallbacks, ImportEvent};
use crate::wizard::file_selector::{DropOutcome, FileSelector};
use crate::wizard::format_preview::FormatPreview;
use crate::wizard::progress_display::{DismissAction, ProgressDisplay};
use crate::wizard::state::{WizardSlots, WizardStep};
use crate::wizard::view::{ScreenView, WizardView};
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, info};
use uuid::Uuid;

// ==========================================
// 内部状态
// ==========================================

/// 当前挂载的页面
#[derive(Debug)]
enum Screen {
    FileSelector(FileSelector),
    FormatPreview(FormatPreview),
    ColumnPicker(ColumnPicker),
    Progress(ProgressDisplay),
}

impl Screen {
    fn step(&self) -> WizardStep {
        match self {
            Screen::FileSelector(_) => WizardStep::SelectingFile,
            Screen::FormatPreview(_) => WizardStep::PreviewingFormat,
            Screen::ColumnPicker(_) => WizardStep::AssigningColumns,
            Screen::Progress(_) => WizardStep::ShowingProgress,
        }
    }

    /// 作废页面持有的异步票据
    fn unmount(&self) {
        match self {
            Screen::FormatPreview(screen) => screen.unmount(),
            Screen::Progress(screen) => screen.unmount(),
            Screen::FileSelector(_) | Screen::ColumnPicker(_) => {}
        }
    }
}

#[derive(Debug)]
struct WizardState {
    slots: WizardSlots,
    fields: FieldList,
    screen: Screen,
}

/// 一次状态变更产生的副作用，在锁外执行
#[derive(Default)]
struct Effects {
    events: Vec<ImportEvent>,
    tasks: Vec<BoxFuture<'static, ()>>,
}

struct Shared {
    session_id: Uuid,
    config: ImporterConfig,
    translation: Translation,
    processor: Arc<dyn ChunkProcessor>,
    callbacks: ImportCallbacks,
    runtime: Handle,
    state: Mutex<WizardState>,
    revision: watch::Sender<u64>,
}

fn invalid_transition(step: WizardStep, action: &str) -> ImportError {
    ImportError::InvalidTransition {
        step: step.to_string(),
        action: action.to_string(),
    }
}

// ==========================================
// Importer - 向导实例
// ==========================================

/// 导入向导
///
/// 克隆得到的句柄共享同一实例。必须在 tokio 运行时内创建。
#[derive(Clone)]
pub struct Importer {
    shared: Arc<Shared>,
}

impl fmt::Debug for Importer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Importer")
            .field("session_id", &self.shared.session_id)
            .field("step", &self.step())
            .finish()
    }
}

impl Importer {
    pub fn builder() -> ImporterBuilder {
        ImporterBuilder::new()
    }

    pub fn session_id(&self) -> Uuid {
        self.shared.session_id
    }

    pub fn config(&self) -> &ImporterConfig {
        &self.shared.config
    }

    pub fn translation(&self) -> &Translation {
        &self.shared.translation
    }

    fn lock_state(&self) -> MutexGuard<'_, WizardState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.shared.revision.send_modify(|revision| *revision += 1);
    }

    /// 锁外执行副作用: 先派发事件，再启动任务
    fn apply_effects(&self, effects: Effects) {
        for event in &effects.events {
            self.shared.callbacks.dispatch(event);
        }
        for task in effects.tasks {
            self.shared.runtime.spawn(task);
        }
    }

    /// 在锁内执行一次状态变更，然后同步页面挂载
    fn update<R, F>(&self, action: &str, f: F) -> ImportResult<R>
    where
        F: FnOnce(&mut WizardState, &mut Effects) -> ImportResult<R>,
    {
        let mut effects = Effects::default();
        let result = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            let before = state.slots.step();

            let result = f(state, &mut effects);
            let mounted = self.remount(state, &mut effects);

            let after = state.slots.step();
            if before != after {
                info!(
                    session = %self.shared.session_id,
                    action,
                    from = %before,
                    to = %after,
                    "向导步骤切换"
                );
            }
            mounted.and(result)
        };

        if let Err(e) = &result {
            debug!(session = %self.shared.session_id, action, error = %e, "操作未执行");
        }
        self.bump();
        self.apply_effects(effects);
        result
    }

    // ==========================================
    // 页面挂载
    // ==========================================

    fn remount(&self, state: &mut WizardState, effects: &mut Effects) -> ImportResult<()> {
        let step = state.slots.step();
        if state.screen.step() == step {
            return Ok(());
        }

        state.screen.unmount();
        match self.mount(step, state, effects) {
            Ok(screen) => {
                debug!(session = %self.shared.session_id, step = %step, "页面挂载");
                state.screen = screen;
                Ok(())
            }
            Err(e) => {
                error!(
                    session = %self.shared.session_id,
                    step = %step,
                    error = %e,
                    "页面挂载失败，向导重置"
                );
                state.slots.reset();
                state.screen = Screen::FileSelector(FileSelector::new(
                    self.shared.config.file_picker.clone(),
                ));
                Err(e)
            }
        }
    }

    fn mount(
        &self,
        step: WizardStep,
        state: &WizardState,
        effects: &mut Effects,
    ) -> ImportResult<Screen> {
        match step {
            WizardStep::SelectingFile => Ok(Screen::FileSelector(FileSelector::new(
                self.shared.config.file_picker.clone(),
            ))),
            WizardStep::PreviewingFormat => self.mount_format_preview(&state.slots, effects),
            WizardStep::AssigningColumns => {
                let preview = state.slots.preview.as_ref().ok_or_else(|| {
                    ImportError::InternalError("列分配页缺少预览信息".to_string())
                })?;
                Ok(Screen::ColumnPicker(ColumnPicker::new(
                    state.fields.clone(),
                    preview,
                )))
            }
            WizardStep::ShowingProgress => self.mount_progress(state, effects),
        }
    }

    fn mount_format_preview(
        &self,
        slots: &WizardSlots,
        effects: &mut Effects,
    ) -> ImportResult<Screen> {
        if slots.edit_format {
            if let Some(preview) = &slots.preview {
                return Ok(Screen::FormatPreview(FormatPreview::with_current(
                    preview.clone(),
                )));
            }
        }

        let file = slots
            .selected_file
            .clone()
            .ok_or_else(|| ImportError::InternalError("格式页缺少文件".to_string()))?;
        let screen = FormatPreview::loading(file.clone(), self.shared.config.assume_no_headers);

        let ticket = screen.ticket();
        let importer = self.clone();
        effects.tasks.push(
            async move {
                let result = parse_preview(file).await;
                importer.commit_preview(ticket, result);
            }
            .boxed(),
        );

        Ok(Screen::FormatPreview(screen))
    }

    fn mount_progress(&self, state: &WizardState, effects: &mut Effects) -> ImportResult<Screen> {
        let preview = state
            .slots
            .preview
            .as_ref()
            .ok_or_else(|| ImportError::InternalError("进度页缺少预览信息".to_string()))?;
        let assignments = state
            .slots
            .field_assignments
            .clone()
            .ok_or_else(|| ImportError::InternalError("进度页缺少列分配".to_string()))?;

        let info = ImportInfo::new(preview.file.clone(), &state.fields, &assignments);
        let screen = ProgressDisplay::new(
            preview,
            info.clone(),
            self.shared.config.restartable,
            self.shared.callbacks.has_close(),
        );

        effects.events.push(ImportEvent::Started(info));
        effects
            .tasks
            .push(self.processing_task(preview, assignments, screen.ticket()));

        Ok(Screen::Progress(screen))
    }

    fn processing_task(
        &self,
        preview: &PreviewInfo,
        assignments: FieldAssignmentMap,
        ticket: OpTicket,
    ) -> BoxFuture<'static, ()> {
        let importer = self.clone();
        let processor = Arc::clone(&self.shared.processor);
        let chunk_size = self.shared.config.chunk_size;
        let file = preview.file.clone();
        let has_headers = preview.has_headers;
        let delimiter = preview.delimiter;

        async move {
            let progress_importer = importer.clone();
            let progress_ticket = ticket.clone();
            let result = process_file_with_delimiter(
                file,
                has_headers,
                &assignments,
                move |delta| progress_importer.commit_progress(&progress_ticket, delta),
                processor.as_ref(),
                chunk_size,
                delimiter,
            )
            .await;
            importer.commit_outcome(ticket, result);
        }
        .boxed()
    }

    // ==========================================
    // 异步结果提交
    // ==========================================

    fn commit_preview(&self, ticket: OpTicket, result: Result<PreviewInfo, PreviewError>) {
        let applied = match &mut self.lock_state().screen {
            Screen::FormatPreview(screen) => screen.commit(&ticket, result),
            _ => {
                debug!(session = %self.shared.session_id, "格式页已卸载，丢弃预览结果");
                false
            }
        };
        if applied {
            self.bump();
        }
    }

    fn commit_progress(&self, ticket: &OpTicket, delta: usize) {
        let applied = match &mut self.lock_state().screen {
            Screen::Progress(screen) => screen.add_progress(ticket, delta),
            _ => false,
        };
        if applied {
            self.bump();
        }
    }

    fn commit_outcome(&self, ticket: OpTicket, result: ImportResult<()>) {
        let mut effects = Effects::default();
        let applied = match &mut self.lock_state().screen {
            Screen::Progress(screen) => {
                let applied = screen.finish(&ticket, result);
                if applied && screen.is_succeeded() {
                    effects
                        .events
                        .push(ImportEvent::Completed(screen.info().clone()));
                }
                applied
            }
            _ => {
                debug!(session = %self.shared.session_id, "进度页已卸载，丢弃处理结果");
                false
            }
        };
        if applied {
            self.bump();
            self.apply_effects(effects);
        }
    }

    // ==========================================
    // 渲染
    // ==========================================

    pub fn step(&self) -> WizardStep {
        self.lock_state().slots.step()
    }

    pub fn view(&self) -> WizardView {
        let revision = *self.shared.revision.borrow();
        let state = self.lock_state();
        let translation = &self.shared.translation;

        let (frame, screen) = match &state.screen {
            Screen::FileSelector(screen) => {
                (None, ScreenView::FileSelector(screen.view(translation)))
            }
            Screen::FormatPreview(screen) => (
                Some(screen.frame(translation)),
                ScreenView::FormatPreview(screen.view(translation)),
            ),
            Screen::ColumnPicker(screen) => (
                Some(screen.frame(translation)),
                ScreenView::ColumnPicker(screen.view(translation)),
            ),
            Screen::Progress(screen) => (
                Some(screen.frame(translation)),
                ScreenView::Progress(screen.view(translation)),
            ),
        };

        WizardView {
            step: state.slots.step(),
            revision,
            frame,
            screen,
        }
    }

    /// 订阅状态版本号，每次状态变化都会通知
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// 等待满足条件的快照
    pub async fn wait_for<P>(&self, mut predicate: P) -> ImportResult<WizardView>
    where
        P: FnMut(&WizardView) -> bool,
    {
        let mut receiver = self.subscribe();
        loop {
            let view = self.view();
            if predicate(&view) {
                return Ok(view);
            }
            receiver
                .changed()
                .await
                .map_err(|_| ImportError::InternalError("状态通道已关闭".to_string()))?;
        }
    }

    /// 已确认的预览
    pub fn preview(&self) -> Option<PreviewInfo> {
        self.lock_state().slots.preview.clone()
    }

    /// 已确认的列分配
    pub fn field_assignments(&self) -> Option<FieldAssignmentMap> {
        self.lock_state().slots.field_assignments.clone()
    }

    pub fn fields(&self) -> FieldList {
        self.lock_state().fields.clone()
    }

    // ==========================================
    // 字段列表
    // ==========================================

    /// 新增或替换字段（保持原位置）
    pub fn upsert_field(&self, field: FieldDescriptor) -> ImportResult<()> {
        self.update("upsert_field", |state, _| {
            state.fields.upsert(field);
            if let Screen::ColumnPicker(picker) = &mut state.screen {
                picker.set_fields(state.fields.clone());
            }
            Ok(())
        })
    }

    pub fn remove_field(&self, name: &str) -> ImportResult<bool> {
        self.update("remove_field", |state, _| {
            let removed = state.fields.remove(name);
            if let Screen::ColumnPicker(picker) = &mut state.screen {
                picker.set_fields(state.fields.clone());
            }
            Ok(removed)
        })
    }

    // ==========================================
    // 文件选择
    // ==========================================

    /// 宿主直接选定文件（仍校验类型与大小）
    pub fn select_file(&self, file: Arc<dyn ImportFile>) -> ImportResult<()> {
        self.update("select_file", |state, _| {
            let selector = match &state.screen {
                Screen::FileSelector(selector) => selector,
                _ => return Err(invalid_transition(state.slots.step(), "select_file")),
            };
            selector.check(file.as_ref())?;
            state.slots.selected_file = Some(file);
            Ok(())
        })
    }

    pub fn drop_files(&self, files: Vec<Arc<dyn ImportFile>>) -> ImportResult<DropOutcome> {
        self.update("drop_files", |state, _| {
            let outcome = match &mut state.screen {
                Screen::FileSelector(selector) => selector.drop_files(files)?,
                _ => return Err(invalid_transition(state.slots.step(), "drop_files")),
            };
            if let Some(file) = &outcome.accepted {
                state.slots.selected_file = Some(file.clone());
            }
            Ok(outcome)
        })
    }

    pub fn pick_files(&self, files: Vec<Arc<dyn ImportFile>>) -> ImportResult<DropOutcome> {
        self.update("pick_files", |state, _| {
            let outcome = match &mut state.screen {
                Screen::FileSelector(selector) => selector.pick_files(files)?,
                _ => return Err(invalid_transition(state.slots.step(), "pick_files")),
            };
            if let Some(file) = &outcome.accepted {
                state.slots.selected_file = Some(file.clone());
            }
            Ok(outcome)
        })
    }

    pub fn set_drag_active(&self, active: bool) -> ImportResult<()> {
        self.update("set_drag_active", |state, _| match &mut state.screen {
            Screen::FileSelector(selector) => selector.set_drag_active(active),
            _ => Err(invalid_transition(state.slots.step(), "set_drag_active")),
        })
    }

    // ==========================================
    // 格式预览
    // ==========================================

    pub fn toggle_has_headers(&self) -> ImportResult<bool> {
        self.update("toggle_has_headers", |state, _| match &mut state.screen {
            Screen::FormatPreview(screen) => screen.toggle_has_headers(),
            _ => Err(invalid_transition(state.slots.step(), "toggle_has_headers")),
        })
    }

    // ==========================================
    // 框架按钮
    // ==========================================

    /// 下一步: 确认格式 / 确认分配 / 关闭或重新开始
    pub fn next(&self) -> ImportResult<()> {
        self.update("next", |state, effects| match &mut state.screen {
            Screen::FormatPreview(screen) => {
                let preview = screen.accept()?;
                state.slots.preview = Some(preview);
                state.slots.edit_format = false;
                Ok(())
            }
            Screen::ColumnPicker(picker) => {
                let assignments = picker.accept()?;
                state.slots.field_assignments = Some(assignments);
                Ok(())
            }
            Screen::Progress(screen) => {
                let action = screen.next_action().ok_or_else(|| {
                    ImportError::ActionDisabled("处理尚未结束或已关闭".to_string())
                })?;
                dismiss(&mut state.slots, screen, action, effects)
            }
            Screen::FileSelector(_) => Err(invalid_transition(state.slots.step(), "next")),
        })
    }

    /// 返回: 格式页回到文件选择（丢弃文件与预览），分配页回到格式页（保留预览）
    pub fn back(&self) -> ImportResult<()> {
        self.update("back", |state, _| match &state.screen {
            Screen::FormatPreview(_) => {
                state.slots.selected_file = None;
                state.slots.preview = None;
                state.slots.edit_format = false;
                Ok(())
            }
            Screen::ColumnPicker(_) => {
                state.slots.edit_format = true;
                Ok(())
            }
            _ => Err(invalid_transition(state.slots.step(), "back")),
        })
    }

    /// 次要按钮: 关闭与重新开始同时可用时的"继续上传"
    pub fn secondary(&self) -> ImportResult<()> {
        self.update("secondary", |state, effects| match &mut state.screen {
            Screen::Progress(screen) => {
                let action = screen
                    .secondary_action()
                    .ok_or_else(|| ImportError::ActionDisabled("次要操作不可用".to_string()))?;
                dismiss(&mut state.slots, screen, action, effects)
            }
            _ => Err(invalid_transition(state.slots.step(), "secondary")),
        })
    }

    /// 处理结束后重新开始（需配置 restartable）
    pub fn restart(&self) -> ImportResult<()> {
        self.update("restart", |state, effects| match &mut state.screen {
            Screen::Progress(screen) => {
                if !screen.can_restart() {
                    return Err(ImportError::ActionDisabled("当前不可重新开始".to_string()));
                }
                dismiss(&mut state.slots, screen, DismissAction::Restart, effects)
            }
            _ => Err(invalid_transition(state.slots.step(), "restart")),
        })
    }

    /// 成功后关闭（触发 on_close，至多一次）
    pub fn close(&self) -> ImportResult<()> {
        self.update("close", |state, effects| match &mut state.screen {
            Screen::Progress(screen) => {
                if !screen.can_close() {
                    return Err(ImportError::ActionDisabled("当前不可关闭".to_string()));
                }
                dismiss(&mut state.slots, screen, DismissAction::Close, effects)
            }
            _ => Err(invalid_transition(state.slots.step(), "close")),
        })
    }

    // ==========================================
    // 列分配
    // ==========================================

    fn with_picker<R, F>(&self, action: &str, f: F) -> ImportResult<R>
    where
        F: FnOnce(&mut ColumnPicker) -> ImportResult<R>,
    {
        self.update(action, |state, _| match &mut state.screen {
            Screen::ColumnPicker(picker) => f(picker),
            _ => Err(invalid_transition(state.slots.step(), action)),
        })
    }

    pub fn select_column(&self, column: usize) -> ImportResult<()> {
        self.with_picker("select_column", |picker| picker.select_column(column))
    }

    pub fn assign_selected(&self, field: &str) -> ImportResult<()> {
        self.with_picker("assign_selected", |picker| picker.assign_selected(field))
    }

    pub fn start_drag(&self, column: usize, pointer: (f64, f64)) -> ImportResult<()> {
        self.with_picker("start_drag", |picker| picker.start_drag(column, pointer))
    }

    pub fn hover_field(&self, field: Option<&str>) -> ImportResult<()> {
        self.with_picker("hover_field", |picker| picker.hover_field(field))
    }

    pub fn drop_column(&self) -> ImportResult<Option<String>> {
        self.with_picker("drop_column", |picker| picker.drop_column())
    }

    pub fn cancel_drag(&self) -> ImportResult<()> {
        self.with_picker("cancel_drag", |picker| {
            picker.cancel_drag();
            Ok(())
        })
    }

    pub fn assign_column(&self, field: &str, column: usize) -> ImportResult<()> {
        self.with_picker("assign_column", |picker| picker.assign(field, column))
    }

    pub fn clear_column(&self, column: usize) -> ImportResult<()> {
        self.with_picker("clear_column", |picker| picker.clear_column(column))
    }

    pub fn clear_field(&self, field: &str) -> ImportResult<()> {
        self.with_picker("clear_field", |picker| picker.clear_field(field))
    }

    pub fn next_page(&self) -> ImportResult<bool> {
        self.with_picker("next_page", |picker| Ok(picker.next_page()))
    }

    pub fn prev_page(&self) -> ImportResult<bool> {
        self.with_picker("prev_page", |picker| Ok(picker.prev_page()))
    }
}

/// 关闭或重新开始（一次性）
fn dismiss(
    slots: &mut WizardSlots,
    screen: &mut ProgressDisplay,
    action: DismissAction,
    effects: &mut Effects,
) -> ImportResult<()> {
    if !screen.dismiss() {
        return Err(ImportError::ActionDisabled("已关闭".to_string()));
    }
    match action {
        DismissAction::Close => effects
            .events
            .push(ImportEvent::Closed(screen.info().clone())),
        DismissAction::Restart => slots.reset(),
    }
    Ok(())
}

// ==========================================
// ImporterBuilder - 显式依赖注入
// ==========================================

#[derive(Default)]
pub struct ImporterBuilder {
    config: ImporterConfig,
    fields: FieldList,
    processor: Option<Arc<dyn ChunkProcessor>>,
    callbacks: ImportCallbacks,
    translation: Option<Translation>,
}

impl ImporterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ImporterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn fields(mut self, fields: impl Into<FieldList>) -> Self {
        self.fields = fields.into();
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.upsert(field);
        self
    }

    pub fn processor<P>(mut self, processor: P) -> Self
    where
        P: ChunkProcessor + 'static,
    {
        self.processor = Some(Arc::new(processor));
        self
    }

    pub fn shared_processor(mut self, processor: Arc<dyn ChunkProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn callbacks(mut self, callbacks: ImportCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&ImportInfo) + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.with_on_start(f);
        self
    }

    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&ImportInfo) + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.with_on_complete(f);
        self
    }

    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&ImportInfo) + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.with_on_close(f);
        self
    }

    /// 覆盖配置中的文案表
    pub fn translation(mut self, translation: Translation) -> Self {
        self.translation = Some(translation);
        self
    }

    /// 创建向导
    ///
    /// # 返回
    /// - Err(ConfigValueError): 配置非法或缺少分块处理器
    /// - Err(InternalError): 不在 tokio 运行时内
    pub fn build(self) -> ImportResult<Importer> {
        self.config.validate()?;

        let processor = self.processor.ok_or_else(|| ImportError::ConfigValueError {
            key: "processor".to_string(),
            value: String::new(),
            message: "缺少分块处理器".to_string(),
        })?;
        let runtime = Handle::try_current().map_err(|e| {
            ImportError::InternalError(format!("向导必须在 tokio 运行时内创建: {}", e))
        })?;

        if let Some(locale) = &self.config.locale {
            i18n::set_locale(locale);
        }
        let translation = match self.translation {
            Some(translation) => translation,
            None => self.config.translation()?,
        };

        let session_id = Uuid::new_v4();
        let (revision, _) = watch::channel(0u64);
        info!(
            session = %session_id,
            fields = self.fields.len(),
            chunk_size = ?self.config.chunk_size,
            restartable = self.config.restartable,
            "导入向导创建"
        );

        let state = WizardState {
            slots: WizardSlots::default(),
            fields: self.fields,
            screen: Screen::FileSelector(FileSelector::new(self.config.file_picker.clone())),
        };

        Ok(Importer {
            shared: Arc::new(Shared {
                session_id,
                config: self.config,
                translation,
                processor,
                callbacks: self.callbacks,
                runtime,
                state: Mutex::new(state),
                revision,
            }),
        })
    }
}
