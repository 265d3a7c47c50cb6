// ==========================================
// CSV 导入向导 - 向导配置
// ==========================================
// 职责: 配置结构定义、JSON 加载、键值覆写、校验
// 说明: 所有字段均有默认值，空 JSON 对象即合法配置
// ==========================================

use crate::i18n::Translation;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 分块
    pub const CHUNK_SIZE: &str = "chunk_size";

    // 表头与重启
    pub const ASSUME_NO_HEADERS: &str = "assume_no_headers";
    pub const RESTARTABLE: &str = "restartable";

    // 文案
    pub const LOCALE: &str = "locale";
    pub const TRANSLATION_PREFIX: &str = "translations.";

    // 文件选择
    pub const PICKER_ACCEPT: &str = "file_picker.accept"; // 逗号分隔
    pub const PICKER_MIN_SIZE: &str = "file_picker.min_size";
    pub const PICKER_MAX_SIZE: &str = "file_picker.max_size";
    pub const PICKER_NO_CLICK: &str = "file_picker.no_click";
    pub const PICKER_NO_DRAG: &str = "file_picker.no_drag";
}

// ==========================================
// FilePickerOptions - 文件选择行为
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePickerOptions {
    /// 接受的扩展名（".csv"）或类型（"text/csv", "text/*"）；为空表示不限制
    pub accept: Vec<String>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    /// 禁用点击选择
    pub no_click: bool,
    /// 禁用拖放
    pub no_drag: bool,
}

impl Default for FilePickerOptions {
    fn default() -> Self {
        Self {
            accept: vec![".csv".to_string(), "text/csv".to_string()],
            min_size: None,
            max_size: None,
            no_click: false,
            no_drag: false,
        }
    }
}

impl FilePickerOptions {
    /// 检查文件名/类型是否在接受列表中
    pub fn accepts_type(&self, name: &str, content_type: Option<&str>) -> bool {
        if self.accept.is_empty() {
            return true;
        }
        let lower_name = name.to_lowercase();
        let lower_type = content_type.map(|t| t.to_lowercase());

        self.accept.iter().any(|rule| {
            let rule = rule.trim().to_lowercase();
            if rule.starts_with('.') {
                lower_name.ends_with(&rule)
            } else if let Some(prefix) = rule.strip_suffix("/*") {
                lower_type
                    .as_deref()
                    .and_then(|t| t.split_once('/'))
                    .map(|(major, _)| major == prefix)
                    .unwrap_or(false)
            } else {
                lower_type.as_deref() == Some(rule.as_str())
            }
        })
    }

    /// 检查文件大小是否在允许范围
    ///
    /// # 返回
    /// - None: 通过
    /// - Some(reason): 拒绝原因
    pub fn check_size(&self, size: u64) -> Option<String> {
        if let Some(min) = self.min_size {
            if size < min {
                return Some(format!("文件过小: {} 字节 < {} 字节", size, min));
            }
        }
        if let Some(max) = self.max_size {
            if size > max {
                return Some(format!("文件过大: {} 字节 > {} 字节", size, max));
            }
        }
        None
    }
}

// ==========================================
// ImporterConfig - 向导配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// 每次回调的行数，None 使用默认值
    pub chunk_size: Option<usize>,
    /// 强制按无表头处理
    pub assume_no_headers: bool,
    /// 处理结束后允许重新开始
    pub restartable: bool,
    /// 进程级语言（"en" / "zh-CN"），None 保持当前
    pub locale: Option<String>,
    /// 界面文案覆盖（键为 TranslationKey::as_str）
    pub translations: HashMap<String, String>,
    pub file_picker: FilePickerOptions,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            chunk_size: None,
            assume_no_headers: false,
            restartable: false,
            locale: None,
            translations: HashMap::new(),
            file_picker: FilePickerOptions::default(),
        }
    }
}

impl ImporterConfig {
    /// 从 JSON 字符串加载并校验
    pub fn from_json_str(raw: &str) -> ImportResult<Self> {
        let config: ImporterConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载并校验
    pub fn from_json_file(path: impl AsRef<Path>) -> ImportResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ImportError::ConfigReadError {
            key: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// 按键覆写单项配置
    ///
    /// # 参数
    /// - key: config_keys 中的键，或 "translations.<文案键>"
    /// - value: 字符串值；可选数值项传空串表示清除
    pub fn apply_override(&mut self, key: &str, value: &str) -> ImportResult<()> {
        let trimmed = value.trim();
        match key {
            config_keys::CHUNK_SIZE => self.chunk_size = parse_optional(key, trimmed)?,
            config_keys::ASSUME_NO_HEADERS => self.assume_no_headers = parse_bool(key, trimmed)?,
            config_keys::RESTARTABLE => self.restartable = parse_bool(key, trimmed)?,
            config_keys::LOCALE => {
                self.locale = if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                };
            }
            config_keys::PICKER_ACCEPT => {
                self.file_picker.accept = trimmed
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            config_keys::PICKER_MIN_SIZE => {
                self.file_picker.min_size = parse_optional(key, trimmed)?
            }
            config_keys::PICKER_MAX_SIZE => {
                self.file_picker.max_size = parse_optional(key, trimmed)?
            }
            config_keys::PICKER_NO_CLICK => self.file_picker.no_click = parse_bool(key, trimmed)?,
            config_keys::PICKER_NO_DRAG => self.file_picker.no_drag = parse_bool(key, trimmed)?,
            _ => match key.strip_prefix(config_keys::TRANSLATION_PREFIX) {
                Some(text_key) if !text_key.is_empty() => {
                    self.translations
                        .insert(text_key.to_string(), value.to_string());
                }
                _ => {
                    return Err(ImportError::ConfigValueError {
                        key: key.to_string(),
                        value: value.to_string(),
                        message: "未知配置键".to_string(),
                    })
                }
            },
        }
        Ok(())
    }

    /// 批量覆写（遇到第一个错误即返回）
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> ImportResult<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in overrides {
            self.apply_override(key, value)?;
        }
        self.validate()
    }

    /// 校验配置项之间的约束
    pub fn validate(&self) -> ImportResult<()> {
        if self.chunk_size == Some(0) {
            return Err(ImportError::ConfigValueError {
                key: config_keys::CHUNK_SIZE.to_string(),
                value: "0".to_string(),
                message: "分块行数必须为正整数".to_string(),
            });
        }

        if let (Some(min), Some(max)) = (self.file_picker.min_size, self.file_picker.max_size) {
            if min > max {
                return Err(ImportError::ConfigValueError {
                    key: config_keys::PICKER_MIN_SIZE.to_string(),
                    value: min.to_string(),
                    message: format!("最小文件大小大于最大文件大小 {}", max),
                });
            }
        }

        if let Some(locale) = &self.locale {
            if !rust_i18n::available_locales!().iter().any(|l| *l == locale.as_str()) {
                return Err(ImportError::ConfigValueError {
                    key: config_keys::LOCALE.to_string(),
                    value: locale.clone(),
                    message: "不支持的语言".to_string(),
                });
            }
        }

        Translation::with_overrides(&self.translations).map(|_| ())
    }

    /// 构建实例级文案表
    pub fn translation(&self) -> ImportResult<Translation> {
        Translation::with_overrides(&self.translations)
    }
}

fn parse_bool(key: &str, value: &str) -> ImportResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ImportError::ConfigValueError {
            key: key.to_string(),
            value: value.to_string(),
            message: "应为布尔值".to_string(),
        }),
    }
}

fn parse_optional<T: std::str::FromStr>(key: &str, value: &str) -> ImportResult<Option<T>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<T>()
        .map(Some)
        .map_err(|_| ImportError::ConfigValueError {
            key: key.to_string(),
            value: value.to_string(),
            message: "应为非负整数".to_string(),
        })
}
