//! 出站队列刷新任务
//!
//! 单个后台任务周期性检查待发消息总数：达到阈值立即取出并并发发送，
//! 否则休眠 `sleep_duration` 后再检查。单个客户端发送失败只记录日志；
//! 发送任务异常退出时本轮记为失败并休眠 `error_sleep_duration`。
//! 循环只会因 [`CancellationToken`] 取消而结束。

use std::sync::Arc;
use std::time::Duration;

use config::MessageQueueConfig;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::ApplicationError;
use crate::state::{CollabState, PendingBatch};

/// 一轮刷新的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// 收到批量消息的客户端数
    pub clients: usize,
    pub delivered: usize,
    pub failed: usize,
    /// 接收者已离线而丢弃的消息数
    pub skipped: usize,
}

/// 一轮检查的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Flushed(FlushReport),
    /// 未达到阈值
    Idle,
}

pub struct MessageFlusher {
    state: Arc<CollabState>,
    config: MessageQueueConfig,
}

impl MessageFlusher {
    pub fn new(state: Arc<CollabState>, config: MessageQueueConfig) -> Self {
        Self { state, config }
    }

    /// 在后台启动刷新循环
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            threshold = self.config.threshold,
            sleep_duration = self.config.sleep_duration,
            error_sleep_duration = self.config.error_sleep_duration,
            "Message queue processor started"
        );

        loop {
            let pause = match self.cycle().await {
                Ok(CycleOutcome::Flushed(report)) => {
                    debug!(
                        clients = report.clients,
                        delivered = report.delivered,
                        failed = report.failed,
                        skipped = report.skipped,
                        "Flushed outbound queue"
                    );
                    Duration::ZERO
                }
                Ok(CycleOutcome::Idle) => self.config.sleep(),
                Err(err) => {
                    error!(error = %err, "Error in message queue processor");
                    self.config.error_sleep()
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!("Message queue processor stopped");
    }

    /// 执行一轮检查：达到阈值时刷新
    pub async fn cycle(&self) -> Result<CycleOutcome, ApplicationError> {
        if self.state.pending_total().await < self.config.threshold {
            return Ok(CycleOutcome::Idle);
        }
        self.flush().await.map(CycleOutcome::Flushed)
    }

    /// 取出全部待发消息，每个客户端一个批次并发发送
    pub async fn flush(&self) -> Result<FlushReport, ApplicationError> {
        let drained = self.state.take_batches().await;
        let mut report = FlushReport {
            clients: drained.batches.len(),
            skipped: drained.skipped_messages,
            ..FlushReport::default()
        };

        let mut sends = JoinSet::new();
        for PendingBatch {
            client_id,
            handle,
            payloads,
        } in drained.batches
        {
            sends.spawn(async move {
                let count = payloads.len();
                let result = handle.send_batch(payloads).await;
                (client_id, count, result)
            });
        }

        let mut aborted = 0usize;
        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((_, count, Ok(()))) => report.delivered += count,
                Ok((client_id, count, Err(err))) => {
                    report.failed += count;
                    warn!(
                        client_id = %client_id,
                        message_count = count,
                        error = %err,
                        "Failed to deliver queued messages"
                    );
                }
                Err(err) => {
                    aborted += 1;
                    error!(error = %err, "Delivery task aborted");
                }
            }
        }

        if aborted > 0 {
            return Err(ApplicationError::flush(format!(
                "{aborted} delivery task(s) aborted"
            )));
        }
        Ok(report)
    }
}
