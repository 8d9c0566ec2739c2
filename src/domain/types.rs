// ==========================================
// 备件仓库单据台账系统 - 领域类型定义
// ==========================================
// 职责: 单据族等跨模块共享的基础类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 单据族 (Document Family)
// ==========================================
// 红线: 两族共用同一转换引擎,差异只体现在分组键与台账去向
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocFamily {
    Receipt, // 入库单（收货）：转换后滚入库存台账
    Issue,   // 领料单（发料）：转换后登记旧件应还台账
}

impl fmt::Display for DocFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocFamily::Receipt => write!(f, "RECEIPT"),
            DocFamily::Issue => write!(f, "ISSUE"),
        }
    }
}

impl DocFamily {
    /// 从字符串解析单据族
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RECEIPT" => Some(DocFamily::Receipt),
            "ISSUE" => Some(DocFamily::Issue),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DocFamily::Receipt => "RECEIPT",
            DocFamily::Issue => "ISSUE",
        }
    }

    /// i18n 显示名 key（family.receipt / family.issue）
    pub fn display_key(&self) -> &'static str {
        match self {
            DocFamily::Receipt => "family.receipt",
            DocFamily::Issue => "family.issue",
        }
    }
}
