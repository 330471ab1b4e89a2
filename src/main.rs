//! # 照片遮罩服务：命令行入口
//!
//! 本文件仅负责日志初始化、参数解析与结果输出。
//! 业务逻辑分布在 `mask_service` 各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use photo_mask::error::AppError;
use photo_mask::mask_service::{
    ApiResult, HealthStatus, MaskConfig, MaskServiceState, SeededRandom, ServiceInfo,
    decode_transport_text,
};

#[derive(Parser, Debug)]
#[command(name = "photo-mask", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch an image by URL and apply a random mask.
    Url(UrlArgs),
    /// Apply a random mask to a local image file.
    Upload(UploadArgs),
    /// Print the service description.
    Info,
    /// Print the liveness status.
    Health,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// API key compared against the configured `API_KEY`.
    #[arg(long, env = "X_API_KEY")]
    api_key: Option<String>,

    /// Seed for reproducible mask selection.
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the resulting PNG to this path.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct UrlArgs {
    /// Source image URL (http/https).
    url: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct UploadArgs {
    /// Source image file.
    file: PathBuf,

    /// Declared content type; sniffed from the file when omitted.
    #[arg(long)]
    content_type: Option<String>,

    #[command(flatten)]
    common: CommonArgs,
}

fn build_service(seed: Option<u64>) -> Result<MaskServiceState, AppError> {
    let config = MaskConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;
    log::info!(
        "启动配置 - masks_dir={} max_file_size={} timeout={}s api_key_required={}",
        config.masks_dir.display(),
        config.max_file_size,
        config.download_timeout,
        config.api_key.is_some()
    );

    let service = match seed {
        Some(seed) => MaskServiceState::with_random(config, Arc::new(SeededRandom::new(seed)))?,
        None => MaskServiceState::with_config(config)?,
    };
    Ok(service)
}

fn write_output(result: &ApiResult, out: Option<&PathBuf>) -> Result<(), AppError> {
    let (Some(path), ApiResult::Success(success)) = (out, result) else {
        return Ok(());
    };

    let png = decode_transport_text(&success.image_data)?;
    std::fs::write(path, png)?;
    log::info!("💾 已写出 PNG：{}", path.display());
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let (result, out) = match cli.cmd {
        Command::Info => {
            print_json(&ServiceInfo::current())?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Health => {
            print_json(&HealthStatus::healthy())?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Url(args) => {
            let service = build_service(args.common.seed)?;
            let result = service
                .mask_by_url(&args.url, args.common.api_key.as_deref())
                .await;
            (result, args.common.out)
        }
        Command::Upload(args) => {
            let service = build_service(args.common.seed)?;
            let bytes = tokio::fs::read(&args.file)
                .await
                .map_err(AppError::from)
                .with_context(|| format!("read {}", args.file.display()))?;
            let result = service
                .mask_by_upload(
                    bytes.into(),
                    args.content_type.as_deref(),
                    args.common.api_key.as_deref(),
                )
                .await;
            (result, args.common.out)
        }
    };

    write_output(&result, out.as_ref())?;
    print_json(&result)?;

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
