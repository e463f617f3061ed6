//! Test/merge history serialization (`history.json`).
//!
//! A JSON array of records, one per history node, in table order — the
//! contribution members and merge-provenance parent links reference nodes by
//! this position. Optional fields are omitted from the JSON when unset.

use crate::error::Error;
use crate::MEMBER_HISTORY;
use coverdb_model::{HistoryKind, HistoryNode, TestStatus};
use serde::{Deserialize, Serialize};
use tracing::warn;

const KIND_TEST: &str = "TEST";
const KIND_MERGE: &str = "MERGE";

fn default_status_code() -> u8 {
    TestStatus::Ok.code()
}

#[derive(Serialize, Deserialize)]
struct Record {
    logical_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    physical_name: Option<String>,
    #[serde(default)]
    kind: String,
    #[serde(default = "default_status_code")]
    test_status: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sim_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run_cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cpu_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compulsory: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vendor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vendor_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vendor_tool_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    same_tests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl From<&HistoryNode> for Record {
    fn from(node: &HistoryNode) -> Self {
        Self {
            logical_name: node.logical_name.clone(),
            physical_name: node.physical_name.clone(),
            kind: match node.kind {
                HistoryKind::Test => KIND_TEST.to_string(),
                HistoryKind::Merge => KIND_MERGE.to_string(),
            },
            test_status: node.status.code(),
            parent: node.parent,
            sim_time: node.sim_time,
            time_unit: node.time_unit.clone(),
            run_cwd: node.run_cwd.clone(),
            cpu_time: node.cpu_time,
            seed: node.seed.clone(),
            cmd: node.cmd.clone(),
            args: node.args.clone(),
            compulsory: node.compulsory,
            date: node.date.clone(),
            user_name: node.user_name.clone(),
            cost: node.cost,
            tool_category: node.tool_category.clone(),
            vendor_id: node.vendor_id.clone(),
            vendor_tool: node.vendor_tool.clone(),
            vendor_tool_version: node.vendor_tool_version.clone(),
            same_tests: node.same_tests,
            comment: node.comment.clone(),
        }
    }
}

impl Record {
    fn into_node(self) -> HistoryNode {
        let kind = match self.kind.as_str() {
            KIND_TEST => HistoryKind::Test,
            KIND_MERGE => HistoryKind::Merge,
            other => {
                warn!(kind = other, "unknown history kind, treated as TEST");
                HistoryKind::Test
            }
        };
        let status = TestStatus::from_code(self.test_status).unwrap_or_else(|| {
            warn!(code = self.test_status, "unknown test status, treated as OK");
            TestStatus::Ok
        });
        HistoryNode {
            logical_name: self.logical_name,
            physical_name: self.physical_name,
            kind,
            status,
            parent: self.parent,
            sim_time: self.sim_time,
            time_unit: self.time_unit,
            run_cwd: self.run_cwd,
            cpu_time: self.cpu_time,
            seed: self.seed,
            cmd: self.cmd,
            args: self.args,
            compulsory: self.compulsory,
            date: self.date,
            user_name: self.user_name,
            cost: self.cost,
            tool_category: self.tool_category,
            vendor_id: self.vendor_id,
            vendor_tool: self.vendor_tool,
            vendor_tool_version: self.vendor_tool_version,
            same_tests: self.same_tests,
            comment: self.comment,
        }
    }
}

pub fn serialize(nodes: &[HistoryNode]) -> Result<Vec<u8>, Error> {
    let records: Vec<Record> = nodes.iter().map(Record::from).collect();
    serde_json::to_vec_pretty(&records).map_err(|e| Error::json(MEMBER_HISTORY, e))
}

pub fn deserialize(data: &[u8]) -> Result<Vec<HistoryNode>, Error> {
    let records: Vec<Record> =
        serde_json::from_slice(data).map_err(|e| Error::json(MEMBER_HISTORY, e))?;
    Ok(records.into_iter().map(Record::into_node).collect())
}
