// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use std::error::Error;
use warehouse_ledger::config::IntakeConfigReader;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub issue_item_prefixes: Vec<String>,
    pub receipt_min_unit_weight: f64,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            issue_item_prefixes: vec![
                "SP-".to_string(),
                "GT-".to_string(),
                "UC-".to_string(),
                "CO-".to_string(),
            ],
            receipt_min_unit_weight: 0.0,
        }
    }

    /// 创建自定义单重下限的配置
    pub fn with_min_unit_weight(min_weight: f64) -> Self {
        let mut config = Self::default();
        config.receipt_min_unit_weight = min_weight;
        config
    }

    /// 创建自定义前缀白名单的配置
    pub fn with_prefixes(prefixes: &[&str]) -> Self {
        let mut config = Self::default();
        config.issue_item_prefixes = prefixes.iter().map(|p| p.to_string()).collect();
        config
    }
}

#[async_trait]
impl IntakeConfigReader for MockConfig {
    async fn get_issue_item_prefixes(&self) -> Result<Vec<String>, Box<dyn Error>> {
        Ok(self.issue_item_prefixes.clone())
    }

    async fn get_receipt_min_unit_weight(&self) -> Result<f64, Box<dyn Error>> {
        Ok(self.receipt_min_unit_weight)
    }
}
