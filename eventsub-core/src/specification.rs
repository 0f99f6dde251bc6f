//! 规约（Specification）
//!
//! 用于 `MatchCriteria` 的扩展谓词：在模板之外表达任意业务条件，并可通过
//! `and` / `or` / `not` 组合。
//!

/// 规约模式的核心 trait
///
/// 谓词会在多个分发任务间共享，因此要求 `Send + Sync`。
pub trait Specification<T>: Send + Sync {
    /// 检查候选对象是否满足规约
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    /// 与另一个规约进行 AND 组合
    fn and<S>(self, other: S) -> AndSpecification<T>
    where
        Self: Sized + 'static,
        S: Specification<T> + 'static,
    {
        AndSpecification::new(Box::new(self), Box::new(other))
    }

    /// 与另一个规约进行 OR 组合
    fn or<S>(self, other: S) -> OrSpecification<T>
    where
        Self: Sized + 'static,
        S: Specification<T> + 'static,
    {
        OrSpecification::new(Box::new(self), Box::new(other))
    }

    /// 对规约进行 NOT 操作
    fn not(self) -> NotSpecification<T>
    where
        Self: Sized + 'static,
    {
        NotSpecification::new(Box::new(self))
    }
}

/// 以闭包实现的规约
pub struct FnSpecification<F> {
    f: F,
}

impl<F> FnSpecification<F> {
    pub fn new<T>(f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync,
    {
        Self { f }
    }
}

impl<T, F> Specification<T> for FnSpecification<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (self.f)(candidate)
    }
}

/// AND 组合规约
pub struct AndSpecification<T> {
    left: Box<dyn Specification<T>>,
    right: Box<dyn Specification<T>>,
}

impl<T> AndSpecification<T> {
    pub fn new(left: Box<dyn Specification<T>>, right: Box<dyn Specification<T>>) -> Self {
        Self { left, right }
    }
}

impl<T> Specification<T> for AndSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) && self.right.is_satisfied_by(candidate)
    }
}

/// OR 组合规约
pub struct OrSpecification<T> {
    left: Box<dyn Specification<T>>,
    right: Box<dyn Specification<T>>,
}

impl<T> OrSpecification<T> {
    pub fn new(left: Box<dyn Specification<T>>, right: Box<dyn Specification<T>>) -> Self {
        Self { left, right }
    }
}

impl<T> Specification<T> for OrSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) || self.right.is_satisfied_by(candidate)
    }
}

/// NOT 规约
pub struct NotSpecification<T> {
    inner: Box<dyn Specification<T>>,
}

impl<T> NotSpecification<T> {
    pub fn new(inner: Box<dyn Specification<T>>) -> Self {
        Self { inner }
    }
}

impl<T> Specification<T> for NotSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        !self.inner.is_satisfied_by(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EventEnvelope;

    fn has_action(action: &'static str) -> FnSpecification<impl Fn(&EventEnvelope) -> bool> {
        FnSpecification::new(move |e: &EventEnvelope| e.action() == Some(action))
    }

    fn event(action: &str) -> EventEnvelope {
        EventEnvelope::builder().id("e").action(action).build()
    }

    #[test]
    fn combinators_compose() {
        let created_or_updated = has_action("created").or(has_action("updated"));
        assert!(created_or_updated.is_satisfied_by(&event("created")));
        assert!(created_or_updated.is_satisfied_by(&event("updated")));
        assert!(!created_or_updated.is_satisfied_by(&event("deleted")));

        let not_deleted = has_action("deleted").not();
        assert!(not_deleted.is_satisfied_by(&event("created")));

        let both = has_action("created").and(has_action("created").not());
        assert!(!both.is_satisfied_by(&event("created")));
    }
}
