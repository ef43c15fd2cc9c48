use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 单飞执行保护
///
/// 同一时刻最多只有一轮套利评估在运行。评估期间到达的触发信号直接丢弃，不排队。
/// 状态由 [`GuardPermit`] 持有，许可释放 (包括提前返回和 panic 展开) 时自动回到空闲。
#[derive(Debug, Default)]
pub struct ExecutionGuard {
    evaluating: AtomicBool,
    started: AtomicU64,
    completed: AtomicU64,
    dropped: AtomicU64,
    executed: AtomicU64,
    failed: AtomicU64,
}

/// 计数快照 (状态页展示)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardStats {
    pub evaluating: bool,
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub triggers_dropped: u64,
    pub trades_executed: u64,
    pub trades_failed: u64,
}

impl ExecutionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle -> Evaluating (CAS)，已在评估中时返回 None
    pub fn try_acquire(&self) -> Option<GuardPermit<'_>> {
        self.evaluating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.started.fetch_add(1, Ordering::Relaxed);
        Some(GuardPermit { guard: self })
    }

    pub fn is_evaluating(&self) -> bool {
        self.evaluating.load(Ordering::Acquire)
    }

    pub fn record_dropped(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> GuardStats {
        GuardStats {
            evaluating: self.is_evaluating(),
            cycles_started: self.started.load(Ordering::Relaxed),
            cycles_completed: self.completed.load(Ordering::Relaxed),
            triggers_dropped: self.dropped.load(Ordering::Relaxed),
            trades_executed: self.executed.load(Ordering::Relaxed),
            trades_failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// 评估许可，Drop 时无条件回到 Idle
#[derive(Debug)]
pub struct GuardPermit<'a> {
    guard: &'a ExecutionGuard,
}

impl Drop for GuardPermit<'_> {
    fn drop(&mut self) {
        self.guard.completed.fetch_add(1, Ordering::Relaxed);
        self.guard.evaluating.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_single_permit() {
        let guard = ExecutionGuard::new();

        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_evaluating());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_evaluating());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_released_on_panic() {
        let guard = Arc::new(ExecutionGuard::new());
        let cloned = guard.clone();

        let result = std::panic::catch_unwind(move || {
            let _permit = cloned.try_acquire().unwrap();
            panic!("boom");
        });

        assert!(result.is_err());
        assert!(!guard.is_evaluating());
        assert_eq!(guard.stats().cycles_completed, 1);
    }

    #[test]
    fn test_concurrent_acquire_admits_one() {
        let guard = Arc::new(ExecutionGuard::new());
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    // 持有许可直到所有线程都尝试过
                    let permit = guard.try_acquire();
                    let acquired = permit.is_some();
                    std::thread::sleep(std::time::Duration::from_millis(50));
                    acquired
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|acquired| *acquired)
            .count();

        assert_eq!(admitted, 1);
        assert_eq!(guard.stats().cycles_started, 1);
    }
}
