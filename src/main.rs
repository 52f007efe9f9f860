use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use spleeter_studio::Studio;
use spleeter_studio::backend::bridge::ProcessBridge;
use spleeter_studio::common::logger::PrettyLogger;
use spleeter_studio::common::models::StemCount;
use spleeter_studio::events::StudioEvent;
use spleeter_studio::task::models::{SeparationTask, TaskStatus};
use spleeter_studio::{log_error, log_info, log_step, log_success, log_warning};

mod cli;

use cli::Command;

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = cli::Cli::parse();

    // 初始化日志
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = args.to_config();
    debug!("运行参数: {:?}", config);

    let bridge = Arc::new(ProcessBridge::new(
        config.python_cmd.clone(),
        config.backend_script.clone(),
    ));
    let studio = Studio::new(&config, bridge).context("创建后端客户端失败")?;
    PrettyLogger::title(format!("Spleeter Studio v{}", studio.app_version()));

    match &args.command {
        Command::Separate {
            input,
            output_dir,
            stems,
        } => run_separate(&studio, input, output_dir, *stems).await,
        Command::Analyze { input } => run_analyze(&studio, input).await,
        Command::Models => run_models(&studio).await,
        Command::Health => run_health(&studio).await,
    }
}

async fn run_separate(studio: &Studio, input: &Path, output_dir: &Path, stems: u8) -> Result<()> {
    let stems = StemCount::try_from(stems)?;
    let file = studio
        .select_file(input)
        .await
        .with_context(|| format!("读取输入文件失败: {:?}", input))?;

    PrettyLogger::audio_file(&file);
    PrettyLogger::file_info("输出目录", output_dir.to_string_lossy());
    log_info!("{} ({})", stems, stems.description());

    if !studio.can_start(Some(&file), Some(output_dir)) {
        bail!("已有任务正在处理中");
    }

    log_step!("开始分离");
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );

    // 订阅必须在提交之前，否则会漏掉早期事件
    let mut rx = studio.subscribe();
    let renderer_pb = pb.clone();
    let renderer = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(StudioEvent::TaskChanged(task)) => render_task(&renderer_pb, &task),
                Ok(StudioEvent::BackendStatusChanged(status)) => {
                    renderer_pb.set_message(status.label());
                }
                Ok(StudioEvent::ProcessingChanged(_)) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    studio.start_separation(&file, output_dir, stems).await;
    let task = studio.wait_for_completion().await;

    renderer.abort();
    pb.finish_and_clear();

    let Some(task) = task else {
        bail!("任务已被清除");
    };
    PrettyLogger::task_summary(&task);

    match task.status {
        TaskStatus::Completed => {
            log_success!("输出文件保存在 {:?}", task.output_dir);
            Ok(())
        }
        _ => bail!(
            "分离失败: {}",
            task.error_message.as_deref().unwrap_or("未知错误")
        ),
    }
}

fn render_task(pb: &ProgressBar, task: &SeparationTask) {
    pb.set_position(u64::from(task.percent()));

    let mut message = task.current_step.clone().unwrap_or_default();
    if let Some(eta) = task.eta_seconds {
        message.push_str(&format!(" (剩余约 {}s)", eta));
    }
    pb.set_message(message);
}

async fn run_analyze(studio: &Studio, input: &Path) -> Result<()> {
    let file = studio
        .select_file(input)
        .await
        .with_context(|| format!("读取输入文件失败: {:?}", input))?;

    log_step!("分析音频");
    let analysis = studio.analyze(&file).await?;
    let file = file.with_duration(analysis.audio_info.duration);
    let info = &analysis.audio_info;

    PrettyLogger::audio_file(&file);
    if let Some(samplerate) = info.samplerate {
        log_info!("采样率: {} Hz", samplerate);
    }
    if let Some(channels) = info.channels {
        log_info!("声道数: {}", channels);
    }
    if let Some(format) = &info.format {
        log_info!("格式: {}", format);
    }
    if let Some(tempo) = info.tempo {
        log_info!("速度: {:.1} BPM", tempo);
    }
    log_info!("预计处理时间: {:.0}s", analysis.estimated_processing_time);
    Ok(())
}

async fn run_models(studio: &Studio) -> Result<()> {
    let models = match studio.list_models().await {
        Ok(models) => models,
        Err(e) => {
            log_error!("获取模型列表失败: {}", e);
            return Err(e.into());
        }
    };

    PrettyLogger::separator();
    for model in models {
        println!("  {:<8} {}", model.name, model.description);
    }
    Ok(())
}

async fn run_health(studio: &Studio) -> Result<()> {
    let result = studio.ensure_available().await;
    PrettyLogger::backend_status(studio.backend_status());

    if let Err(e) = result {
        warn!("后端不可用: {}", e);
        log_warning!("请确认已安装后端依赖: pip install -r py-backend/requirements.txt");
        return Err(e.into());
    }
    Ok(())
}
