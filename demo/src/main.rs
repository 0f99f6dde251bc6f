use anyhow::Context;
use async_trait::async_trait;
use eventsub_core::{
    Args, Dispatcher, DispatcherConfig, ErrorCategory, EventEnvelope, HandlingOutcome,
    HandlingPolicy, MatchCriteria, OutcomeExecutor, ReceiveError, Subscriber,
    SubscriberDescriptor, SubscriberError, SubscriptionRegistry, TypedSubscriber,
};
use eventsub_core::specification::{FnSpecification, NotSpecification, Specification};
use eventsub_host::{
    CountingInstrumentation, HostConfig, InMemoryEventSource, InMemoryWorkTracker,
    SubscriptionHost,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct DemoConfig {
    dispatcher: DispatcherConfig,
    host: HostConfig,
}

impl DemoConfig {
    /// 从 `EVENTSUB_CONFIG` 指向的 JSON 文件读取 `dispatcher` / `host` 两节，
    /// 未设置或缺少某一节时使用默认值
    fn load() -> anyhow::Result<Self> {
        let Ok(path) = std::env::var("EVENTSUB_CONFIG") else {
            return Ok(Self::default());
        };
        let raw =
            std::fs::read_to_string(&path).with_context(|| format!("read config file {path}"))?;
        Self::parse(&raw).with_context(|| format!("config file {path}"))
    }

    fn parse(raw: &str) -> anyhow::Result<Self> {
        let root: Value = serde_json::from_str(raw).context("parse config document")?;

        let dispatcher = match root.get("dispatcher") {
            Some(section) => DispatcherConfig::from_json(&section.to_string())
                .context("dispatcher section")?,
            None => DispatcherConfig::default(),
        };
        let host = match root.get("host") {
            Some(section) => HostConfig::from_json(&section.to_string()).context("host section")?,
            None => HostConfig::default(),
        };
        Ok(Self { dispatcher, host })
    }
}

#[derive(Debug, Deserialize)]
struct AccountOpened {
    account_id: String,
    initial_balance: i64,
}

struct AccountProjection;

#[async_trait]
impl TypedSubscriber for AccountProjection {
    type Payload = AccountOpened;

    fn name(&self) -> &str {
        "account-projection"
    }

    fn handling_policy(&self) -> HandlingPolicy {
        HandlingPolicy::default()
            .on(ErrorCategory::InvalidData, HandlingOutcome::CompleteWarning)
            .on(ErrorCategory::Transient, HandlingOutcome::Retry)
    }

    async fn handle(
        &self,
        _event: &EventEnvelope,
        payload: AccountOpened,
        _args: &mut Args,
        _cancel: &CancellationToken,
    ) -> Result<(), ReceiveError> {
        if payload.initial_balance < 0 {
            return Err(SubscriberError::validation(format!(
                "account {} opened with negative balance",
                payload.account_id
            ))
            .into());
        }
        info!(account_id = %payload.account_id, balance = payload.initial_balance, "account projected");
        Ok(())
    }
}

struct AuditLog;

#[async_trait]
impl Subscriber for AuditLog {
    fn name(&self) -> &str {
        "audit-log"
    }

    fn handling_policy(&self) -> HandlingPolicy {
        HandlingPolicy::default().on(ErrorCategory::Security, HandlingOutcome::CompleteError)
    }

    async fn receive(
        &self,
        event: &EventEnvelope,
        args: &mut Args,
        _cancel: &CancellationToken,
    ) -> Result<(), ReceiveError> {
        if event.action() == Some("impersonate") {
            return Err(SubscriberError::unauthorized("impersonation is not audited").into());
        }
        args.insert("audited".into(), json!(true));
        info!(event_id = %event.id(), action = event.action().unwrap_or("-"), "audit entry written");
        Ok(())
    }
}

/// 服务账号的登录不进审计
fn not_service_account() -> NotSpecification<EventEnvelope> {
    FnSpecification::new(|e: &EventEnvelope| {
        e.subject().is_some_and(|s| s.starts_with("admin/service/"))
    })
    .not()
}

fn subscriptions() -> Vec<SubscriberDescriptor> {
    vec![
        SubscriberDescriptor::typed(
            AccountProjection,
            vec![
                MatchCriteria::builder()
                    .subject("accounts/*")
                    .event_type("Bank.AccountOpened")
                    .build(),
            ],
        ),
        SubscriberDescriptor::new(
            Arc::new(AuditLog),
            vec![
                MatchCriteria::builder()
                    .subject("admin/**")
                    .actions(vec!["login*".into(), "impersonate".into()])
                    .predicate(Arc::new(not_service_account()))
                    .build(),
            ],
        ),
    ]
}

fn events() -> Vec<EventEnvelope> {
    vec![
        EventEnvelope::builder()
            .id("evt-1")
            .subject("accounts/a-1")
            .event_type("Bank.AccountOpened")
            .value(json!({ "account_id": "a-1", "initial_balance": 100 }))
            .build(),
        EventEnvelope::builder()
            .id("evt-2")
            .subject("accounts/a-2")
            .event_type("Bank.AccountOpened")
            .value(json!({ "account_id": "a-2", "initial_balance": -5 }))
            .build(),
        EventEnvelope::builder()
            .id("evt-3")
            .subject("admin/users/42")
            .action("login_succeeded")
            .build(),
        EventEnvelope::builder()
            .id("evt-4")
            .subject("admin/users/42")
            .action("impersonate")
            .build(),
        EventEnvelope::builder()
            .id("evt-6")
            .subject("admin/service/backup")
            .action("login_succeeded")
            .build(),
        EventEnvelope::builder()
            .id("evt-5")
            .subject("reports/daily")
            .build(),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,eventsub_core=debug")),
        )
        .init();

    let config = DemoConfig::load()?;
    info!(?config, "configuration loaded");

    let registry: SubscriptionRegistry = subscriptions().into_iter().collect();
    let tracker = InMemoryWorkTracker::new();
    let counter = CountingInstrumentation::new();
    let dispatcher = Dispatcher::builder()
        .registry(Arc::new(registry))
        .config(config.dispatcher)
        .executor(
            OutcomeExecutor::builder()
                .work_tracker(Arc::new(tracker.clone()))
                .instrumentation(Arc::new(counter.clone()))
                .build(),
        )
        .build();

    let source = InMemoryEventSource::new(config.host.source_capacity);
    let handle = Arc::new(
        SubscriptionHost::builder()
            .source(Arc::new(source.clone()))
            .dispatcher(Arc::new(dispatcher))
            .config(config.host)
            .build(),
    )
    .start();

    while source.subscriber_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    for event in events() {
        source.publish(event)?;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    handle.shutdown();
    handle.join().await;

    for (event_id, record) in tracker.snapshot() {
        println!(
            "{event_id}: {:?} {}",
            record.state,
            record.message.as_deref().unwrap_or("")
        );
    }
    println!(
        "successes={} failures={}",
        counter.successes(),
        counter.failures()
    );
    Ok(())
}
