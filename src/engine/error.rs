// ==========================================
// 备件仓库单据台账系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 校验错误必须逐字段给出消息,存储错误意味着整次运行已回滚
// ==========================================

use crate::repository::error::RepositoryError;
use std::collections::BTreeMap;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 输入校验失败（字段名 → 错误消息,不重试）
    #[error("输入校验失败: {}", format_fields(.fields))]
    Validation { fields: BTreeMap<String, String> },

    /// 目标记录不存在
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    /// 存储层失败,本次运行已整体回滚,重新调用即可（转换是幂等的）
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl EngineError {
    /// 构造单字段校验错误
    pub fn validation_field(field: &str, message: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.to_string());
        EngineError::Validation { fields }
    }
}

fn format_fields(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
