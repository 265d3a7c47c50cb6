// ==========================================
// CSV 导入向导 - 进度估算
// ==========================================
// 规则: 由预览行的平均字节数估算总行数，
//       再用渐近曲线把已处理行数映射为百分比
// 约束: 完成信号之前永远不会显示 100%
// ==========================================

/// 平均行长退化时的总行数估计
pub const FALLBACK_ROW_ESTIMATE: f64 = 100.0;

/// 曲线系数: 估计准确时约在 3/4 以上的位置
pub const PROGRESS_POWER_FACTOR: f64 = 2.5;

/// 预览行的平均编码字节数（每个单元格额外计 1 字节分隔符/换行）
pub fn average_row_bytes(rows: &[Vec<String>]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }

    let total: usize = rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.len() + 1).sum::<usize>())
        .sum();

    Some(total as f64 / rows.len() as f64)
}

/// 估算文件总行数
pub fn estimate_row_count(rows: &[Vec<String>], file_size: u64) -> f64 {
    match average_row_bytes(rows) {
        Some(avg) if avg > 1.0 => {
            let estimate = file_size as f64 / avg;
            if estimate > 0.0 {
                estimate
            } else {
                FALLBACK_ROW_ESTIMATE
            }
        }
        _ => FALLBACK_ROW_ESTIMATE,
    }
}

/// 未完成时的进度上限
pub const MAX_PENDING_PERCENTAGE: f64 = 99.9;

/// 渐近进度百分比，保留 0.1 精度；只有完成信号才返回 100
pub fn progress_percentage(processed: usize, estimated: f64, is_complete: bool) -> f64 {
    if is_complete {
        return 100.0;
    }

    let estimated = if estimated > 0.0 {
        estimated
    } else {
        FALLBACK_ROW_ESTIMATE
    };

    let power = PROGRESS_POWER_FACTOR * (processed as f64 / estimated);
    let left = 0.5_f64.powf(power);

    ((1000.0 - 1000.0 * left).floor() / 10.0).min(MAX_PENDING_PERCENTAGE)
}

/// 单次导入的进度计数器
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    estimated_rows: f64,
    processed_rows: usize,
}

impl ProgressEstimator {
    pub fn new(preview_rows: &[Vec<String>], file_size: u64) -> Self {
        Self {
            estimated_rows: estimate_row_count(preview_rows, file_size),
            processed_rows: 0,
        }
    }

    pub fn add(&mut self, delta: usize) {
        self.processed_rows = self.processed_rows.saturating_add(delta);
    }

    pub fn processed_rows(&self) -> usize {
        self.processed_rows
    }

    pub fn estimated_rows(&self) -> f64 {
        self.estimated_rows
    }

    pub fn percentage(&self, is_complete: bool) -> f64 {
        progress_percentage(self.processed_rows, self.estimated_rows, is_complete)
    }
}
