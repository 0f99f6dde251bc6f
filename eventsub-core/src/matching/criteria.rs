use super::{SUBJECT_SEPARATOR, TYPE_SEPARATOR, template};
use crate::envelope::EventEnvelope;
use crate::specification::Specification;
use bon::Builder;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// 来源模板
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceTemplate {
    /// `*`：任意来源
    Any,
    /// 相对模板：只匹配路径
    Relative(String),
    /// 绝对模板：协议、主机与端口须一致
    Absolute(Url),
}

impl SourceTemplate {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == "*" {
            return Self::Any;
        }
        // 只有带主机的 URL 才按绝对模板处理，`orders:eu/*` 之类仍是相对路径
        match Url::parse(s) {
            Ok(url) if url.has_host() => Self::Absolute(url),
            _ => Self::Relative(s.to_string()),
        }
    }
}

impl From<&str> for SourceTemplate {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for SourceTemplate {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Url> for SourceTemplate {
    fn from(url: Url) -> Self {
        Self::Absolute(url)
    }
}

/// 匹配条件
///
/// 条件中未设置的字段不参与比较；但主题、类型、动作、来源四者全部未设置的条件
/// 永远不匹配，避免空条件意外订阅所有事件。
///
/// 来源模板只约束带来源的事件：只设置了来源的条件会匹配所有不带来源的事件。
/// 需要排除这类事件时，再加上主题/类型模板或谓词。
#[derive(Builder, Clone, Default)]
pub struct MatchCriteria {
    #[builder(into)]
    subject: Option<String>,
    #[builder(into)]
    event_type: Option<String>,
    #[builder(default)]
    actions: Vec<String>,
    #[builder(into)]
    source: Option<SourceTemplate>,
    #[builder(default)]
    ignore_case: bool,
    predicate: Option<Arc<dyn Specification<EventEnvelope>>>,
}

impl MatchCriteria {
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn source(&self) -> Option<&SourceTemplate> {
        self.source.as_ref()
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// 四个模板字段是否全部未设置
    pub fn is_unconstrained(&self) -> bool {
        self.subject.is_none()
            && self.event_type.is_none()
            && self.actions.is_empty()
            && self.source.is_none()
    }

    /// 判断事件是否满足该条件
    pub fn is_match(&self, event: &EventEnvelope) -> bool {
        if self.is_unconstrained() {
            return false;
        }

        let ignore_case = self.ignore_case;

        if self.subject.is_some()
            && !template::matches(
                self.subject(),
                event.subject(),
                SUBJECT_SEPARATOR,
                ignore_case,
            )
        {
            return false;
        }

        if self.event_type.is_some()
            && !template::matches(
                self.event_type(),
                event.event_type(),
                TYPE_SEPARATOR,
                ignore_case,
            )
        {
            return false;
        }

        if let Some(actual) = event.source() {
            if !template::matches_source(self.source(), actual, ignore_case) {
                return false;
            }
        }

        if !self.actions.is_empty()
            && !self
                .actions
                .iter()
                .any(|t| template::matches_flat(Some(t), event.action(), ignore_case))
        {
            return false;
        }

        self.predicate
            .as_ref()
            .is_none_or(|p| p.is_satisfied_by(event))
    }
}

impl fmt::Debug for MatchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchCriteria")
            .field("subject", &self.subject)
            .field("event_type", &self.event_type)
            .field("actions", &self.actions)
            .field("source", &self.source)
            .field("ignore_case", &self.ignore_case)
            .field("predicate", &self.predicate.as_ref().map(|_| ".."))
            .finish()
    }
}
