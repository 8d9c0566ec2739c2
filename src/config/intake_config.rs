// ==========================================
// 备件仓库单据台账系统 - 暂存接收配置读取 Trait
// ==========================================
// 职责: 定义暂存接收模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// IntakeConfigReader Trait
// ==========================================
// 用途: 暂存接收模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait IntakeConfigReader: Send + Sync {
    /// 获取领料单物料编码前缀白名单
    ///
    /// # 返回
    /// - Vec<String>: 前缀列表,领料行物料编码必须以其中之一开头才接收
    ///
    /// # 默认值
    /// - ["SP-", "GT-", "UC-", "CO-"]
    ///
    /// # 用途
    /// - 领料单暂存接收时过滤非备件物料行
    async fn get_issue_item_prefixes(&self) -> Result<Vec<String>, Box<dyn Error>>;

    /// 获取入库单接收的最小单重（千克）
    ///
    /// # 返回
    /// - f64: 单重下限,入库行单重必须大于该值才接收
    ///
    /// # 默认值
    /// - 0.0
    ///
    /// # 用途
    /// - 入库单暂存接收时过滤无重量数据的行
    async fn get_receipt_min_unit_weight(&self) -> Result<f64, Box<dyn Error>>;
}
