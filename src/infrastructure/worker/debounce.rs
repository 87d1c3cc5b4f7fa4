//! Debouncer - 可重置的延迟触发
//!
//! 每次 `schedule` 都把截止时间推到 now + delay，之前的计划随之作废。
//! 本身不持有任务，由 actor 的 select 循环等待 `fired`。

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// 取消已有计划并重新计时
    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// 等到截止时间；没有计划时永远不返回
    ///
    /// 返回后计划仍然存在，调用方需要 `cancel`。
    pub async fn fired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_unscheduled_never_fires() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        assert!(!debouncer.is_pending());
        assert!(timeout(Duration::from_secs(60), debouncer.fired()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let mut debouncer = Debouncer::new(Duration::from_secs(2));
        debouncer.schedule();

        assert!(timeout(Duration::from_millis(1900), debouncer.fired()).await.is_err());
        assert!(timeout(Duration::from_millis(200), debouncer.fired()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_pushes_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_secs(2));
        let start = Instant::now();
        debouncer.schedule();

        tokio::time::sleep(Duration::from_secs(1)).await;
        debouncer.schedule();

        debouncer.fired().await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.schedule();
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert!(timeout(Duration::from_secs(1), debouncer.fired()).await.is_err());
    }
}
