use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// 生成本地临时任务ID: `task_{毫秒时间戳}_{序号}`
///
/// 序号在进程内单调递增，同一毫秒内多次提交也不会重复。
/// 后端返回正式ID后以后端为准，这里的ID只在提交阶段使用。
pub fn provisional_task_id() -> String {
    let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("task_{}_{}", Utc::now().timestamp_millis(), seq)
}
