// ==========================================
// CSV 导入向导 - 命令行入口
// ==========================================
// 以无界面方式驱动向导: 选择本地文件 → 等待预览 → 按表头或位置分配字段
// → 分块处理，每块以一行 JSON 输出到 stdout
// 日志写入 stderr
// ==========================================

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use csv_import_wizard::config::ImporterConfig;
use csv_import_wizard::wizard::ProgressOutcome;
use csv_import_wizard::{
    chunk_fn, logging, BaseRow, ChunkInfo, FieldDescriptor, FieldList, Importer, LocalFile,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "csv-import-wizard")]
#[command(about = "CSV 导入向导 - 预览、列分配、分块输出 JSON", long_about = None)]
struct Cli {
    /// 待导入的 CSV 文件
    #[arg(required = true)]
    file: PathBuf,

    /// 目标字段（可重复）；以 ? 结尾表示可选，如 --field email --field phone?
    #[arg(short, long = "field", required = true)]
    fields: Vec<String>,

    /// JSON 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 配置覆写 KEY=VALUE（可重复），如 --set chunk_size=500
    #[arg(long = "set")]
    overrides: Vec<String>,

    /// 每块行数
    #[arg(long)]
    chunk_size: Option<usize>,

    /// 按无表头处理
    #[arg(long)]
    no_headers: bool,

    /// 按字段顺序对应列位置，而不是按表头名称匹配
    #[arg(long)]
    by_position: bool,

    /// 以 JSON 行格式输出日志
    #[arg(long)]
    json_logs: bool,
}

fn parse_field(raw: &str) -> FieldDescriptor {
    let raw = raw.trim();
    match raw.strip_suffix('?') {
        Some(name) => FieldDescriptor::optional(name, name),
        None => FieldDescriptor::required(raw, raw),
    }
}

fn parse_override(raw: &str) -> anyhow::Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("配置覆写格式应为 KEY=VALUE: {}", raw))?;
    Ok((key.trim().to_string(), value.to_string()))
}

fn load_config(cli: &Cli) -> anyhow::Result<ImporterConfig> {
    let mut config = match &cli.config {
        Some(path) => ImporterConfig::from_json_file(path)?,
        None => ImporterConfig::default(),
    };

    let overrides = cli
        .overrides
        .iter()
        .map(|raw| parse_override(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    config.apply_overrides(overrides.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;

    if cli.chunk_size.is_some() {
        config.chunk_size = cli.chunk_size;
    }
    if cli.no_headers {
        config.assume_no_headers = true;
    }
    // 本地文件不受扩展名限制
    config.file_picker.accept.clear();
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(logging::LogFormat::from_json_flag(cli.json_logs));

    info!("CSV 导入向导 v{}", csv_import_wizard::VERSION);

    let config = load_config(&cli)?;
    let fields: FieldList = cli.fields.iter().map(|raw| parse_field(raw)).collect();

    let processor = chunk_fn(|rows: Vec<BaseRow>, info: ChunkInfo| async move {
        let line = serde_json::to_string(&json!({
            "start_index": info.start_index,
            "rows": rows,
        }))?;
        println!("{}", line);
        Ok::<(), anyhow::Error>(())
    });

    let importer = Importer::builder()
        .config(config)
        .fields(fields)
        .processor(processor)
        .build()?;

    // 1. 选择文件
    let file = LocalFile::from_path(&cli.file).await?;
    importer.select_file(Arc::new(file))?;

    // 2. 等待预览
    let view = importer.wait_for(|v| v.is_preview_settled()).await?;
    if let Some(preview) = view.format_preview() {
        if let Some(error) = &preview.error {
            bail!("{}", error);
        }
        if let Some(warning) = &preview.warning {
            bail!("{}", warning);
        }
    }
    importer.next()?;

    // 3. 分配字段
    let preview = importer
        .preview()
        .ok_or_else(|| anyhow!("预览确认后缺少预览信息"))?;
    let column_count = preview.first_rows.first().map(|row| row.len()).unwrap_or(0);
    let headers = preview.header_row().map(|row| row.to_vec());

    for (position, field) in importer.fields().iter().enumerate() {
        let column = match (&headers, cli.by_position) {
            (Some(headers), false) => headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(&field.name)),
            _ => Some(position).filter(|p| *p < column_count),
        };
        match column {
            Some(column) => {
                importer.assign_column(&field.name, column)?;
                info!(field = %field.name, column, "字段已分配");
            }
            None => info!(field = %field.name, "未找到对应列"),
        }
    }
    importer
        .next()
        .context("必填字段未能全部匹配到列")?;

    // 4. 等待处理结束
    let view = importer.wait_for(|v| v.is_processing_finished()).await?;
    let progress = view
        .progress()
        .ok_or_else(|| anyhow!("处理结束后不在进度页"))?;
    if let ProgressOutcome::Failed(message) = &progress.outcome {
        bail!("{}", message);
    }

    info!(rows = progress.processed_rows, "导入完成");
    Ok(())
}
