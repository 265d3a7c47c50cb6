// ==========================================
// CSV 导入向导 - 向导层
// ==========================================
// 步骤: 选择文件 → 格式预览 → 列分配 → 导入进度
// 形态: 无界面的视图模型；宿主按 WizardView 渲染，调用 Importer 的方法响应用户操作
// ==========================================

pub mod column_picker;
pub mod events;
pub mod file_selector;
pub mod format_preview;
pub mod frame;
pub mod importer;
pub mod progress_display;
pub mod state;
pub mod view;

// 重导出核心类型
pub use column_picker::{
    ColumnPicker, ColumnPickerView, DragState, SourceColumnView, TargetFieldView,
    SOURCES_PAGE_SIZE,
};
pub use events::{ImportCallbacks, ImportEvent, LifecycleCallback};
pub use file_selector::{DropOutcome, FileSelector, FileSelectorView, RejectedFile};
pub use format_preview::{FormatPreview, FormatPreviewView, RawPreview, RAW_PREVIEW_SIZE};
pub use frame::{FrameView, ImporterFrame};
pub use importer::{Importer, ImporterBuilder};
pub use progress_display::{DismissAction, ProgressDisplay, ProgressOutcome, ProgressView};
pub use state::{WizardSlots, WizardStep};
pub use view::{ScreenView, WizardView};
