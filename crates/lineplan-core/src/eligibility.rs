//! 產線適用性模型

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{PlanError, Result};

/// 產線設定：所屬區塊與可生產的專案前綴
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineProfile {
    /// 所屬區塊
    pub block: String,

    /// 可生產的專案前綴
    pub projects: BTreeSet<String>,
}

/// 適用性表：產線 → 產線設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityTable {
    lines: BTreeMap<String, LineProfile>,
}

impl EligibilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：添加產線
    pub fn with_line<I, S>(mut self, line: impl Into<String>, block: impl Into<String>, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(line, block, projects);
        self
    }

    /// 添加（或覆寫）產線
    pub fn insert<I, S>(&mut self, line: impl Into<String>, block: impl Into<String>, projects: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.insert(
            line.into(),
            LineProfile {
                block: block.into(),
                projects: projects.into_iter().map(Into::into).collect(),
            },
        );
    }

    /// 產線是否存在
    pub fn contains(&self, line: &str) -> bool {
        self.lines.contains_key(line)
    }

    /// 產線設定，未定義的產線為配置錯誤
    pub fn profile(&self, line: &str) -> Result<&LineProfile> {
        self.lines
            .get(line)
            .ok_or_else(|| PlanError::UnknownLine(line.to_string()))
    }

    /// 產線所屬區塊
    pub fn block_of(&self, line: &str) -> Result<&str> {
        self.profile(line).map(|p| p.block.as_str())
    }

    /// 專案是否可在產線生產
    pub fn is_eligible(&self, line: &str, project: &str) -> Result<bool> {
        self.profile(line).map(|p| p.projects.contains(project))
    }

    /// 可生產該專案的所有產線（依產線代碼排序）
    pub fn lines_for_project(&self, project: &str) -> Vec<String> {
        self.lines
            .iter()
            .filter(|(_, profile)| profile.projects.contains(project))
            .map(|(line, _)| line.clone())
            .collect()
    }

    /// 區塊內的產線
    pub fn lines_in_block(&self, block: &str) -> Vec<String> {
        self.lines
            .iter()
            .filter(|(_, profile)| profile.block == block)
            .map(|(line, _)| line.clone())
            .collect()
    }

    /// 所有區塊
    pub fn blocks(&self) -> BTreeSet<String> {
        self.lines.values().map(|p| p.block.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LineProfile)> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
