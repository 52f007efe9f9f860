use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use spleeter_studio::StudioConfig;
use spleeter_studio::common::models::StemCount;
use spleeter_studio::config::DEFAULT_BACKEND_URL;

/// Spleeter Studio 命令行前端
#[derive(Parser, Debug)]
#[command(name = "spleeter-studio")]
#[command(version)]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "调用 Spleeter 后端进行音轨分离", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// 后端地址
    #[arg(long, value_name = "URL", global = true)]
    #[arg(default_value = DEFAULT_BACKEND_URL)]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub backend_url: String,

    /// Python 解释器
    #[arg(long, value_name = "CMD", global = true, default_value = "python3")]
    pub python: String,

    /// 后端脚本路径
    #[arg(long, value_name = "FILE", global = true)]
    #[arg(default_value = "py-backend/main.py")]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub backend_script: PathBuf,

    #[arg(long, value_name = "N", global = true, default_value_t = 10)]
    #[arg(help = "健康检查最多尝试次数")]
    pub health_retries: u32,

    #[arg(long, value_name = "MS", global = true, default_value_t = 500)]
    #[arg(help = "两次健康检查之间的间隔（毫秒）")]
    pub health_delay_ms: u64,

    #[arg(long, value_name = "MS", global = true, default_value_t = 1000)]
    #[arg(help = "任务状态轮询间隔（毫秒）")]
    pub poll_interval_ms: u64,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 分离音频文件
    Separate {
        /// 输入音频 (WAV, MP3, FLAC)
        #[arg(long, value_name = "FILE")]
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,

        /// 分离结果保存目录
        #[arg(long, value_name = "DIR")]
        #[arg(value_hint = clap::ValueHint::DirPath)]
        output_dir: PathBuf,

        #[arg(long, default_value_t = 2)]
        #[arg(value_parser = parse_stems)]
        #[arg(help = "音轨数量: 2=人声+伴奏, 4=人声+鼓+贝斯+其他, 5=再加钢琴")]
        stems: u8,
    },
    /// 查看音频信息和预计处理时间
    Analyze {
        #[arg(long, value_name = "FILE")]
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,
    },
    /// 列出可用的分离模型
    Models,
    /// 检查后端状态，必要时启动
    Health,
}

fn parse_stems(raw: &str) -> Result<u8, String> {
    let value: u8 = raw.parse().map_err(|e| format!("{}", e))?;
    StemCount::try_from(value)
        .map(StemCount::count)
        .map_err(|e| e.to_string())
}

impl Cli {
    pub fn to_config(&self) -> StudioConfig {
        StudioConfig {
            backend_url: self.backend_url.clone(),
            health_attempts: self.health_retries.max(1),
            health_delay: Duration::from_millis(self.health_delay_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            python_cmd: self.python.clone(),
            backend_script: self.backend_script.clone(),
            ..StudioConfig::default()
        }
    }
}
