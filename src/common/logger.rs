use colored::*;

use crate::common::models::{AudioFile, BackendStatus};
use crate::task::models::{SeparationTask, TaskStatus};

/// 终端输出工具
pub struct PrettyLogger;

impl PrettyLogger {
    /// 显示成功消息
    pub fn success(message: impl AsRef<str>) {
        println!("{} {}", "✓".green().bold(), message.as_ref());
    }

    /// 显示信息消息
    pub fn info(message: impl AsRef<str>) {
        println!("{} {}", "ℹ".blue().bold(), message.as_ref());
    }

    /// 显示警告消息
    pub fn warning(message: impl AsRef<str>) {
        println!("{} {}", "⚠".yellow().bold(), message.as_ref());
    }

    /// 显示错误消息
    pub fn error(message: impl AsRef<str>) {
        println!("{} {}", "✗".red().bold(), message.as_ref());
    }

    /// 显示步骤开始
    pub fn step_start(step: impl AsRef<str>) {
        println!("\n{} {}", "▶".cyan().bold(), step.as_ref().bold());
    }

    /// 显示文件信息
    pub fn file_info(label: impl AsRef<str>, path: impl AsRef<str>) {
        println!("{} {}: {}", "📁".blue().bold(), label.as_ref().bold(), path.as_ref());
    }

    pub fn audio_file(file: &AudioFile) {
        let mut details = file.size_label();
        if let Some(duration) = file.duration_label() {
            details.push_str(&format!(" • {}", duration));
        }
        println!("{} {} ({})", "🎵".magenta().bold(), file.name.bold(), details.cyan());
    }

    pub fn backend_status(status: BackendStatus) {
        let label = match status {
            BackendStatus::Connected => status.label().green(),
            BackendStatus::Connecting => status.label().yellow(),
            BackendStatus::Disconnected => status.label().red(),
        };
        println!("{} {}", "⚙".bold(), label.bold());
    }

    /// 显示分割线
    pub fn separator() {
        println!("{}", "─".repeat(50).bright_black());
    }

    /// 显示标题
    pub fn title(text: impl AsRef<str>) {
        let text = text.as_ref();
        let width = text.chars().count().min(48);
        let padding = (48 - width) / 2;
        let line = "─".repeat(padding);
        println!(
            "{} {} {}",
            line.bright_black(),
            text.bold(),
            "─".repeat(48 - padding - width).bright_black()
        );
    }

    /// 显示任务结果
    pub fn task_summary(task: &SeparationTask) {
        Self::separator();
        match task.status {
            TaskStatus::Completed => {
                println!("\n{}", "🎉 分离完成！".green().bold());
                for name in task.output_file_names() {
                    println!("  {}", name);
                }
            }
            TaskStatus::Error => {
                println!("\n{}", "分离失败".red().bold());
                if let Some(message) = &task.error_message {
                    println!("  {}", message.red());
                }
            }
            TaskStatus::Pending | TaskStatus::Processing => {
                println!("\n{} {}%", task.status.label().yellow().bold(), task.percent());
            }
        }
        if let Some(elapsed) = task.elapsed() {
            println!("  {} {}s", "耗时".bright_black(), elapsed.num_seconds());
        }
    }
}

/// 便捷宏用于漂亮的日志输出
#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::success(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::warning(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::error(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_step {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::step_start(format!($($arg)*))
    };
}
