use super::HandlingOutcome;
use crate::error::SubscriberException;
use crate::tracking::{Instrumentation, WorkTracker};
use bon::Builder;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 进程终止钩子（可替换，便于测试）
pub trait FailFast: Send + Sync {
    fn fail_fast(&self, message: &str, error: &SubscriberException);
}

/// 默认钩子：记录后立即中止进程
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessFailFast;

impl FailFast for ProcessFailFast {
    fn fail_fast(&self, message: &str, error: &SubscriberException) {
        error!(event_id = %error.event_id(), error = %error, "{message}; aborting process");
        std::process::abort();
    }
}

macro_rules! log_exception {
    ($level:ident, $exc:expr, $msg:literal) => {
        $level!(
            event_id = %$exc.event_id(),
            subscriber = $exc.subscriber().unwrap_or("-"),
            source = %$exc.source(),
            category = %$exc.category(),
            error_code = $exc.error_code().as_i32(),
            error = $exc.message(),
            $msg
        )
    };
}

/// 处理结果执行器
///
/// | 结果 | is_transient | 工作状态 | 日志 | 终态 |
/// |---|---|---|---|---|
/// | HandleByHost | 不变 | - | - | 原样抛出 |
/// | HandleBySubscriber / Retry | true | indeterminate | - | 抛出 |
/// | Complete* | false | fail | DEBUG/INFO/WARN/ERROR | 吞掉 |
/// | CriticalFailFast | false | fail | ERROR(critical) | 终止钩子后抛出 |
#[derive(Builder, Clone)]
pub struct OutcomeExecutor {
    work_tracker: Option<Arc<dyn WorkTracker>>,
    instrumentation: Option<Arc<dyn Instrumentation>>,
    #[builder(default = Arc::new(ProcessFailFast) as Arc<dyn FailFast>)]
    fail_fast: Arc<dyn FailFast>,
}

impl Default for OutcomeExecutor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl OutcomeExecutor {
    /// 成功分支：标记完成并记录成功埋点
    pub async fn succeed(&self, event_id: &str) {
        if let Some(tracker) = &self.work_tracker {
            if let Err(err) = tracker.complete(event_id).await {
                warn!(event_id, error = %err, "work tracker failed to record completion");
            }
        }
        if let Some(sink) = &self.instrumentation {
            sink.instrument(None, None);
        }
    }

    /// 执行处理结果：`Ok(())` 表示失败已被吞掉，`Err` 表示需要调用方处理
    ///
    /// 已执行过处理结果的失败原样返回，不产生任何副作用。
    pub async fn execute(
        &self,
        outcome: HandlingOutcome,
        mut exception: SubscriberException,
    ) -> Result<(), SubscriberException> {
        if exception.is_resolved() {
            debug!(
                event_id = %exception.event_id(),
                outcome = ?exception.handling_override(),
                "failure already handled, rethrowing unchanged"
            );
            return Err(exception);
        }

        exception.resolve(outcome);
        if let Some(sink) = &self.instrumentation {
            sink.instrument(Some(outcome), Some(&exception));
        }

        match outcome {
            HandlingOutcome::HandleByHost => Err(exception),
            HandlingOutcome::HandleBySubscriber | HandlingOutcome::Retry => {
                self.indeterminate(&exception).await;
                Err(exception)
            }
            HandlingOutcome::CompleteSilent => {
                self.fail(&exception).await;
                log_exception!(debug, exception, "event completed after handled failure");
                Ok(())
            }
            HandlingOutcome::CompleteInfo => {
                self.fail(&exception).await;
                log_exception!(info, exception, "event completed after handled failure");
                Ok(())
            }
            HandlingOutcome::CompleteWarning => {
                self.fail(&exception).await;
                log_exception!(warn, exception, "event completed after handled failure");
                Ok(())
            }
            HandlingOutcome::CompleteError => {
                self.fail(&exception).await;
                log_exception!(error, exception, "event completed after handled failure");
                Ok(())
            }
            HandlingOutcome::CriticalFailFast => {
                self.fail(&exception).await;
                error!(
                    critical = true,
                    event_id = %exception.event_id(),
                    subscriber = exception.subscriber().unwrap_or("-"),
                    source = %exception.source(),
                    category = %exception.category(),
                    error_code = exception.error_code().as_i32(),
                    error = exception.message(),
                    "critical failure while dispatching event"
                );
                let message = format!("critical failure on event {}", exception.event_id());
                self.fail_fast.fail_fast(&message, &exception);
                // 钩子未终止进程时仍然抛出
                Err(exception)
            }
        }
    }

    async fn fail(&self, exception: &SubscriberException) {
        let Some(tracker) = &self.work_tracker else {
            return;
        };
        if let Err(err) = tracker.fail(exception.event_id(), exception.message()).await {
            warn!(event_id = %exception.event_id(), error = %err, "work tracker failed to record failure");
        }
    }

    async fn indeterminate(&self, exception: &SubscriberException) {
        let Some(tracker) = &self.work_tracker else {
            return;
        };
        if let Err(err) = tracker
            .indeterminate(exception.event_id(), exception.message())
            .await
        {
            warn!(event_id = %exception.event_id(), error = %err, "work tracker failed to record indeterminate state");
        }
    }
}
