//! 把后端返回的状态片段合并到当前任务上

use chrono::{DateTime, Utc};
use tracing::warn;

use super::models::{SeparationTask, TaskStatus, TaskUpdate};

/// 使用当前时间合并更新
pub fn apply_update(previous: Option<&SeparationTask>, update: &TaskUpdate) -> Option<SeparationTask> {
    apply_update_at(previous, update, Utc::now())
}

/// 合并规则:
/// - update 中提供的字段覆盖旧值，未提供的字段保留
/// - 首次进入终态时记录 end_time，之后不再覆盖
/// - eta_seconds 是例外：进入终态且 update 未提供时清空
/// - previous 为空（任务已被清除）时不做任何事
pub fn apply_update_at(
    previous: Option<&SeparationTask>,
    update: &TaskUpdate,
    now: DateTime<Utc>,
) -> Option<SeparationTask> {
    let previous = previous?;
    let mut task = previous.clone();

    if let Some(id) = &update.task_id {
        task.id = id.clone();
    }
    if let Some(status) = update.status {
        task.status = status;
    }
    if let Some(progress) = update.progress {
        if progress_regressed(previous, update) {
            warn!(
                "任务 {} 进度回退: {:.3} -> {:.3}",
                previous.id, previous.progress, progress
            );
        }
        task.progress = progress;
    }
    if let Some(step) = &update.current_step {
        task.current_step = Some(step.clone());
    }
    if let Some(eta) = update.eta_seconds {
        task.eta_seconds = Some(eta);
    }
    if let Some(message) = &update.error_message {
        task.error_message = Some(message.clone());
    }
    if let Some(files) = &update.output_files {
        task.output_files = Some(files.clone());
    }

    if task.status.is_terminal() {
        // 终态没有剩余时间
        if update.eta_seconds.is_none() {
            task.eta_seconds = None;
        }
        if task.end_time.is_none() {
            task.end_time = Some(now);
        }
    }

    Some(task)
}

/// 处理中到处理中的进度下降。后端的值照样采用，这里只负责发现
pub fn progress_regressed(previous: &SeparationTask, update: &TaskUpdate) -> bool {
    let still_processing = previous.status == TaskStatus::Processing
        && update.status.unwrap_or(previous.status) == TaskStatus::Processing;

    match update.progress {
        Some(progress) => still_processing && progress < previous.progress,
        None => false,
    }
}
