//! 模板匹配
//!
//! 段内字符通配：`*` 匹配零个或多个字符，`?` 匹配恰好一个字符；
//! 按分隔符切段后逐段比较，末段为 `**` 时吸收其余所有实际段。
//!
use super::SourceTemplate;
use std::borrow::Cow;
use url::{Host, Url};

const ANY: &str = "*";
const ANY_DESCENDANTS: &str = "**";

/// 分段模板匹配，`actual` 缺失视为空串
pub fn matches(template: Option<&str>, actual: Option<&str>, separator: char, ignore_case: bool) -> bool {
    let template = template.unwrap_or_default();
    let actual = actual.unwrap_or_default();
    if template.is_empty() || template == ANY {
        return true;
    }

    let template = fold(template, ignore_case);
    let actual = fold(actual, ignore_case);
    if template == actual {
        return true;
    }

    let t: Vec<&str> = template.split(separator).collect();
    let a: Vec<&str> = actual.split(separator).collect();
    if t.len() > a.len() {
        return false;
    }

    if !t.iter().zip(&a).all(|(t, a)| wildcard_match(t, a, false)) {
        return false;
    }

    a.len() == t.len() || t.last() == Some(&ANY_DESCENDANTS)
}

/// 不分段的字符通配匹配
pub fn matches_flat(template: Option<&str>, actual: Option<&str>, ignore_case: bool) -> bool {
    let template = template.unwrap_or_default();
    if template.is_empty() || template == ANY {
        return true;
    }
    wildcard_match(template, actual.unwrap_or_default(), ignore_case)
}

/// 事件来源匹配
///
/// 相对模板只比较路径；绝对模板还要求协议、主机、主机类型与端口完全一致。
pub fn matches_source(template: Option<&SourceTemplate>, actual: &Url, ignore_case: bool) -> bool {
    match template {
        None | Some(SourceTemplate::Any) => true,
        Some(SourceTemplate::Relative(path)) => match_path(path, actual.path(), ignore_case),
        Some(SourceTemplate::Absolute(template)) => {
            template.scheme() == actual.scheme()
                && same_host(template.host(), actual.host())
                && template.port_or_known_default() == actual.port_or_known_default()
                && match_path(template.path(), actual.path(), ignore_case)
        }
    }
}

fn match_path(template: &str, actual: &str, ignore_case: bool) -> bool {
    matches(
        Some(template.trim_start_matches('/')),
        Some(actual.trim_start_matches('/')),
        '/',
        ignore_case,
    )
}

fn same_host(template: Option<Host<&str>>, actual: Option<Host<&str>>) -> bool {
    match (template, actual) {
        (None, None) => true,
        (Some(Host::Domain(t)), Some(Host::Domain(a))) => t.eq_ignore_ascii_case(a),
        (Some(Host::Ipv4(t)), Some(Host::Ipv4(a))) => t == a,
        (Some(Host::Ipv6(t)), Some(Host::Ipv6(a))) => t == a,
        _ => false,
    }
}

/// 段内字符通配
pub fn wildcard_match(pattern: &str, text: &str, ignore_case: bool) -> bool {
    let pattern: Vec<char> = fold(pattern, ignore_case).chars().collect();
    let text: Vec<char> = fold(text, ignore_case).chars().collect();

    let (mut p, mut t) = (0, 0);
    // 最近一个 `*` 的位置，以及它当前吸收到的文本位置
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

fn fold(s: &str, ignore_case: bool) -> Cow<'_, str> {
    if ignore_case {
        Cow::Owned(s.to_lowercase())
    } else {
        Cow::Borrowed(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segmented_laws() {
        for value in ["a", "a/b", "orders/created/eu", ""] {
            assert!(matches(Some(value), Some(value), '/', false), "{value}");
        }
        assert!(matches(Some("*"), Some("x/y/z"), '/', false));
        assert!(matches(None, Some("x"), '/', false));
        assert!(matches(Some(""), Some("x"), '/', false));

        assert!(matches(Some("a/**"), Some("a/b/c"), '/', false));
        assert!(!matches(Some("a/*"), Some("a/b/c"), '/', false));
        assert!(matches(Some("a/?b"), Some("a/xb"), '/', false));
        assert!(!matches(Some("a/?b"), Some("a/xxb"), '/', false));
    }

    #[test]
    fn template_longer_than_actual_never_matches() {
        assert!(!matches(Some("a/b/c"), Some("a/b"), '/', false));
        assert!(!matches(Some("a/**"), Some("a"), '/', false));
        assert!(!matches(Some("orders/*"), None, '/', false));
    }

    #[test]
    fn longer_actual_requires_trailing_double_star() {
        assert!(!matches(Some("orders/created"), Some("orders/created/eu"), '/', false));
        assert!(matches(Some("orders/**"), Some("orders/created/eu"), '/', false));
        assert!(!matches(Some("orders/**/eu"), Some("orders/created/x/eu"), '/', false));
        // `**` 作为非末段时只是普通的段内通配
        assert!(matches(Some("orders/**/eu"), Some("orders/created/eu"), '/', false));
    }

    #[test]
    fn separator_is_honored() {
        assert!(matches(Some("com.acme.*"), Some("com.acme.order"), '.', false));
        assert!(!matches(Some("com.acme.*"), Some("com.acme.order.created"), '.', false));
        assert!(matches(Some("com.acme.**"), Some("com.acme.order.created"), '.', false));
    }

    #[test]
    fn ignore_case_applies_to_segments() {
        assert!(!matches(Some("Orders/*"), Some("orders/created"), '/', false));
        assert!(matches(Some("Orders/*"), Some("orders/CREATED"), '/', true));
    }

    #[test]
    fn character_wildcards() {
        assert!(wildcard_match("*", "", false));
        assert!(wildcard_match("ord*", "orders", false));
        assert!(wildcard_match("*ers", "orders", false));
        assert!(wildcard_match("o*d*s", "orders", false));
        assert!(wildcard_match("??ders", "orders", false));
        assert!(!wildcard_match("?", "", false));
        assert!(!wildcard_match("ord", "orders", false));
        assert!(!wildcard_match("o*x", "orders", false));
        assert!(wildcard_match("*a*b", "xaxxab", false));
    }

    #[test]
    fn flat_action_matching() {
        assert!(matches_flat(Some("*"), Some("created"), false));
        assert!(matches_flat(Some(""), None, false));
        assert!(matches_flat(Some("crea*"), Some("created"), false));
        assert!(matches_flat(Some("a/*"), Some("a/b/c"), false));
        assert!(!matches_flat(Some("deleted"), Some("created"), false));
        assert!(matches_flat(Some("CREATED"), Some("created"), true));
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn source_any_and_missing_template_match() {
        let actual = url("https://shop.example.com/orders/1");
        assert!(matches_source(None, &actual, false));
        assert!(matches_source(Some(&SourceTemplate::Any), &actual, false));
    }

    #[test]
    fn relative_source_matches_path_only() {
        let actual = url("https://shop.example.com/orders/eu/1");
        let template = SourceTemplate::from("/orders/**");
        assert!(matches_source(Some(&template), &actual, false));
        let template = SourceTemplate::from("orders/*");
        assert!(!matches_source(Some(&template), &actual, false));
        let template = SourceTemplate::from("orders/*/1");
        assert!(matches_source(Some(&template), &actual, false));
    }

    #[test]
    fn absolute_source_requires_same_authority() {
        let template = SourceTemplate::from("https://shop.example.com/orders/*");
        assert!(matches_source(Some(&template), &url("https://shop.example.com/orders/1"), false));
        assert!(matches_source(Some(&template), &url("https://SHOP.example.com:443/orders/1"), false));
        assert!(!matches_source(Some(&template), &url("http://shop.example.com/orders/1"), false));
        assert!(!matches_source(Some(&template), &url("https://other.example.com/orders/1"), false));
        assert!(!matches_source(Some(&template), &url("https://shop.example.com:8443/orders/1"), false));
        assert!(!matches_source(Some(&template), &url("https://shop.example.com/invoices/1"), false));
    }

    #[test]
    fn absolute_source_distinguishes_host_kind() {
        let template = SourceTemplate::from("http://127.0.0.1/a");
        assert!(matches_source(Some(&template), &url("http://127.0.0.1/a"), false));
        assert!(!matches_source(Some(&template), &url("http://localhost/a"), false));
    }
}
