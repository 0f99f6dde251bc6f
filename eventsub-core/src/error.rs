//! 错误定义与分类
//!
//! - `ErrorCode`：订阅者失败时携带的结构化错误码；
//! - `ErrorCategory`：由错误码推导出的固定分类，用于策略查找；
//! - `SubscriberError`：订阅者抛出的唯一错误值类型；
//! - `SubscriberException`：已分类的失败，一旦形成便不再重新分类；
//! - `DispatchError` / `CoreError`：分发调用与配置/注册层面的错误。
//!
use crate::handling::HandlingOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 结构化错误码
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum ErrorCode {
    Unknown = 0,
    Unauthenticated = 1,
    Unauthorized = 2,
    Business = 3,
    Conflict = 4,
    Duplicate = 5,
    Validation = 6,
    Concurrency = 7,
    DataConsistency = 8,
    NotFound = 9,
    Transient = 10,
    Cancelled = 11,
}

impl ErrorCode {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 未知的整数码统一映射为 `Unknown`
    pub const fn from_i32(code: i32) -> Self {
        match code {
            1 => Self::Unauthenticated,
            2 => Self::Unauthorized,
            3 => Self::Business,
            4 => Self::Conflict,
            5 => Self::Duplicate,
            6 => Self::Validation,
            7 => Self::Concurrency,
            8 => Self::DataConsistency,
            9 => Self::NotFound,
            10 => Self::Transient,
            11 => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    /// 错误码到分类的固定映射表
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::Unauthenticated | Self::Unauthorized => ErrorCategory::Security,
            Self::Business | Self::Conflict | Self::Duplicate | Self::Validation => {
                ErrorCategory::InvalidData
            }
            Self::Concurrency => ErrorCategory::Concurrency,
            Self::DataConsistency => ErrorCategory::DataConsistency,
            Self::NotFound => ErrorCategory::NotFound,
            Self::Transient => ErrorCategory::Transient,
            Self::Unknown | Self::Cancelled => ErrorCategory::Unhandled,
        }
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        Self::from_i32(code)
    }
}

/// 失败分类
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Security,
    Transient,
    NotFound,
    Concurrency,
    InvalidData,
    DataConsistency,
    Unhandled,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 7] = [
        Self::Security,
        Self::Transient,
        Self::NotFound,
        Self::Concurrency,
        Self::InvalidData,
        Self::DataConsistency,
        Self::Unhandled,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Security => "security",
            Self::Transient => "transient",
            Self::NotFound => "not_found",
            Self::Concurrency => "concurrency",
            Self::InvalidData => "invalid_data",
            Self::DataConsistency => "data_consistency",
            Self::Unhandled => "unhandled",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 订阅者抛出的错误
///
/// 分类只依据 `code`，与具体的错误来源类型无关。`handling` 为单次失败的处理覆盖，
/// 存在时优先于订阅者的处理策略。
#[derive(Debug)]
pub struct SubscriberError {
    code: ErrorCode,
    message: String,
    handling: Option<HandlingOutcome>,
    source: Option<anyhow::Error>,
}

impl SubscriberError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            handling: None,
            source: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn concurrency(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Concurrency, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transient, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorCode::Cancelled, "operation cancelled")
    }

    /// 附加底层原因
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 为本次失败指定处理结果，跳过策略查找
    pub fn with_handling(mut self, handling: HandlingOutcome) -> Self {
        self.handling = Some(handling);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn handling(&self) -> Option<HandlingOutcome> {
        self.handling
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    fn into_parts(self) -> (ErrorCode, String, Option<anyhow::Error>) {
        (self.code, self.message, self.source)
    }
}

impl fmt::Display for SubscriberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code={:?})", self.message, self.code)
    }
}

impl std::error::Error for SubscriberError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

// 允许订阅者用 `?` 传播任意错误：能还原出 SubscriberError 的保留其错误码，其余视为未知错误
impl From<anyhow::Error> for SubscriberError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<SubscriberError>() {
            Ok(inner) => inner,
            Err(other) => Self {
                code: ErrorCode::Unknown,
                message: other.to_string(),
                handling: None,
                source: Some(other),
            },
        }
    }
}

/// 已分类失败的来源
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionSource {
    Subscriber,
    Deserialization,
    NotSubscribed,
    Ambiguous,
}

impl ExceptionSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subscriber => "subscriber",
            Self::Deserialization => "deserialization",
            Self::NotSubscribed => "not_subscribed",
            Self::Ambiguous => "ambiguous",
        }
    }
}

impl fmt::Display for ExceptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已分类的失败
///
/// `handling_override` 记录已对其执行过的处理结果；一旦设置，执行器不会再次处理，
/// 从而避免嵌套分发时重复记录日志或结果来回翻转。
#[derive(Debug)]
pub struct SubscriberException {
    message: String,
    cause: Option<anyhow::Error>,
    error_code: ErrorCode,
    is_transient: bool,
    handling_override: Option<HandlingOutcome>,
    source: ExceptionSource,
    event_id: String,
    subscriber: Option<String>,
}

impl SubscriberException {
    pub fn new(
        source: ExceptionSource,
        event_id: impl Into<String>,
        error_code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            cause: None,
            error_code,
            is_transient: false,
            handling_override: None,
            source,
            event_id: event_id.into(),
            subscriber: None,
        }
    }

    /// 包装订阅者抛出的错误
    pub fn from_error(
        error: SubscriberError,
        event_id: impl Into<String>,
        subscriber: impl Into<String>,
    ) -> Self {
        let (code, message, cause) = error.into_parts();
        Self {
            cause,
            subscriber: Some(subscriber.into()),
            ..Self::new(ExceptionSource::Subscriber, event_id, code, message)
        }
    }

    pub fn not_subscribed(event_id: impl Into<String>) -> Self {
        let event_id = event_id.into();
        let message = format!("no subscriber matched event {event_id}");
        Self::new(ExceptionSource::NotSubscribed, event_id, ErrorCode::Unknown, message)
    }

    pub fn ambiguous(event_id: impl Into<String>, first: &str, second: &str) -> Self {
        let event_id = event_id.into();
        let message =
            format!("event {event_id} matched more than one subscriber: {first}, {second}");
        Self::new(ExceptionSource::Ambiguous, event_id, ErrorCode::Unknown, message)
    }

    pub fn deserialization(
        event_id: impl Into<String>,
        subscriber: impl Into<String>,
        payload_type: &str,
        cause: impl Into<anyhow::Error>,
    ) -> Self {
        let cause = cause.into();
        let message = format!("failed to deserialize payload as {payload_type}: {cause}");
        Self {
            cause: Some(cause),
            subscriber: Some(subscriber.into()),
            ..Self::new(
                ExceptionSource::Deserialization,
                event_id,
                ErrorCode::Validation,
                message,
            )
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    pub fn category(&self) -> ErrorCategory {
        self.error_code.category()
    }

    pub fn is_transient(&self) -> bool {
        self.is_transient
    }

    pub fn handling_override(&self) -> Option<HandlingOutcome> {
        self.handling_override
    }

    /// 是否已经执行过处理结果
    pub fn is_resolved(&self) -> bool {
        self.handling_override.is_some()
    }

    pub fn source(&self) -> ExceptionSource {
        self.source
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn subscriber(&self) -> Option<&str> {
        self.subscriber.as_deref()
    }

    pub(crate) fn resolve(&mut self, outcome: HandlingOutcome) {
        if let Some(transient) = outcome.transient() {
            self.is_transient = transient;
        }
        self.handling_override = Some(outcome);
    }
}

impl fmt::Display for SubscriberException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (event={}, source={}, code={:?})",
            self.message, self.event_id, self.source, self.error_code
        )
    }
}

impl std::error::Error for SubscriberException {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

/// 订阅者 `receive` 的失败：原始错误，或已分类的失败（直接透传）
#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error(transparent)]
    Failed(#[from] SubscriberError),
    #[error(transparent)]
    Classified(#[from] SubscriberException),
}

impl From<anyhow::Error> for ReceiveError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<SubscriberException>() {
            Ok(exception) => Self::Classified(exception),
            Err(other) => Self::Failed(SubscriberError::from(other)),
        }
    }
}

/// 分发失败：取消不经分类直接冒泡，其余均为已处理的失败
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch cancelled: event={event_id}")]
    Cancelled { event_id: String },
    #[error(transparent)]
    Subscriber(#[from] SubscriberException),
}

impl DispatchError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Cancelled { .. } => false,
            Self::Subscriber(exception) => exception.is_transient(),
        }
    }

    pub fn exception(&self) -> Option<&SubscriberException> {
        match self {
            Self::Cancelled { .. } => None,
            Self::Subscriber(exception) => Some(exception),
        }
    }
}

/// 配置与注册层面的错误
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {source}")]
    Config {
        #[from]
        source: serde_json::Error,
    },
}

/// 统一 Result 类型别名
pub type CoreResult<T> = Result<T, CoreError>;
