//! 事件匹配（matching）
//!
//! - `template`：主题/类型/动作/来源模板的通配匹配；
//! - `MatchCriteria`：一条匹配条件（主题、类型、动作列表、来源与扩展谓词的组合）；
//! - `SourceTemplate`：来源模板，`*`、相对路径或绝对 URL。
//!
mod criteria;
pub mod template;

pub use criteria::{MatchCriteria, SourceTemplate};
pub use template::{matches, matches_flat, matches_source, wildcard_match};

/// 主题按 `/` 分段
pub const SUBJECT_SEPARATOR: char = '/';
/// 事件类型按 `.` 分段
pub const TYPE_SEPARATOR: char = '.';
