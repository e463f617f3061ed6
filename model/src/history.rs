//! Test and merge history metadata.

/// What a history node records: an individual test run, or a merge of other
/// databases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HistoryKind {
    #[default]
    Test,
    Merge,
}

impl HistoryKind {
    pub const fn code(&self) -> u8 {
        match self {
            Self::Test => 1,
            Self::Merge => 2,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Test),
            2 => Some(Self::Merge),
            _ => None,
        }
    }
}

/// Outcome of a test run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TestStatus {
    #[default]
    Ok,
    Warning,
    Error,
    Fatal,
    Missing,
    MergeError,
}

impl TestStatus {
    pub const fn code(&self) -> u8 {
        match self {
            Self::Ok => 1,
            Self::Warning => 2,
            Self::Error => 3,
            Self::Fatal => 4,
            Self::Missing => 5,
            Self::MergeError => 6,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Ok),
            2 => Some(Self::Warning),
            3 => Some(Self::Error),
            4 => Some(Self::Fatal),
            5 => Some(Self::Missing),
            6 => Some(Self::MergeError),
            _ => None,
        }
    }
}

/// Metadata for one test run (or merge operation) that contributed coverage.
///
/// All fields beyond the names and kind are optional; backends persist only
/// what was recorded. `parent` is the index of the history node this one was
/// merged into, preserving provenance across merge operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryNode {
    pub logical_name: String,
    pub physical_name: Option<String>,
    pub kind: HistoryKind,
    pub status: TestStatus,
    pub parent: Option<u32>,
    pub sim_time: Option<u64>,
    pub time_unit: Option<String>,
    pub run_cwd: Option<String>,
    pub cpu_time: Option<f64>,
    pub seed: Option<String>,
    pub cmd: Option<String>,
    pub args: Option<String>,
    pub compulsory: Option<bool>,
    pub date: Option<String>,
    pub user_name: Option<String>,
    pub cost: Option<f64>,
    pub tool_category: Option<String>,
    pub vendor_id: Option<String>,
    pub vendor_tool: Option<String>,
    pub vendor_tool_version: Option<String>,
    pub same_tests: Option<u32>,
    pub comment: Option<String>,
}

impl HistoryNode {
    pub fn test(logical_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            ..Self::default()
        }
    }

    pub fn merge(logical_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            kind: HistoryKind::Merge,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(HistoryKind::from_code(HistoryKind::Test.code()), Some(HistoryKind::Test));
        assert_eq!(HistoryKind::from_code(HistoryKind::Merge.code()), Some(HistoryKind::Merge));
        assert_eq!(HistoryKind::from_code(0), None);
    }

    #[test]
    fn test_status_codes() {
        for status in [
            TestStatus::Ok,
            TestStatus::Warning,
            TestStatus::Error,
            TestStatus::Fatal,
            TestStatus::Missing,
            TestStatus::MergeError,
        ] {
            assert_eq!(TestStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(TestStatus::from_code(7), None);
    }

    #[test]
    fn test_constructors() {
        let t = HistoryNode::test("smoke");
        assert_eq!(t.kind, HistoryKind::Test);
        assert_eq!(t.logical_name, "smoke");
        assert_eq!(t.status, TestStatus::Ok);
        assert!(t.parent.is_none());

        let m = HistoryNode::merge("nightly_merge");
        assert_eq!(m.kind, HistoryKind::Merge);
    }
}
