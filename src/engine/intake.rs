// ==========================================
// 备件仓库单据台账系统 - 暂存接收引擎
// ==========================================
// 职责: 行级准入过滤 + 暂存落库 + 批次审计
// 红线: 不做列映射和文件解析,入参已是扁平行;
//       被过滤的行不落库,只计数
// ==========================================

use crate::config::IntakeConfigReader;
use crate::domain::staging::{StageResult, StagedRowInput, StagingBatch};
use crate::domain::types::DocFamily;
use crate::repository::staging_repo::StagingRepository;
use chrono::Utc;
use std::error::Error;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

// ==========================================
// StagingIntake - 暂存接收引擎
// ==========================================
/// 暂存接收引擎
///
/// # 职责
/// 1. 按单据族应用准入规则（领料:物料前缀白名单;入库:单重下限）
/// 2. 通过过滤的行连同批次审计行一次事务落库
/// 3. 返回批次 ID 与接收/过滤计数
///
/// # 红线
/// - 过滤规则全部来自配置,不硬编码
/// - 暂存区由调用方显式清空,转换成功不会自动清空
pub struct StagingIntake<C: ?Sized>
where
    C: IntakeConfigReader,
{
    staging_repo: Arc<StagingRepository>,
    config: Arc<C>,
}

impl<C: ?Sized> StagingIntake<C>
where
    C: IntakeConfigReader,
{
    /// 创建新的 StagingIntake 实例
    ///
    /// # 参数
    /// - staging_repo: 暂存区仓储
    /// - config: 配置读取器
    pub fn new(staging_repo: Arc<StagingRepository>, config: Arc<C>) -> Self {
        Self {
            staging_repo,
            config,
        }
    }

    /// 接收一批扁平行进入暂存区(主入口)
    ///
    /// # 参数
    /// - family: 单据族
    /// - rows: 解析/映射后的扁平行
    /// - source_note: 来源备注（文件名等,写入批次审计）
    ///
    /// # 返回
    /// - StageResult: 批次 ID + 提交/暂存/过滤行数
    ///
    /// # 准入规则
    /// - 领料单: 物料编码非空且以配置白名单前缀之一开头
    /// - 入库单: 单重严格大于配置下限（默认 0）
    #[instrument(skip(self, rows), fields(family = %family))]
    pub async fn stage_rows(
        &self,
        family: DocFamily,
        rows: Vec<StagedRowInput>,
        source_note: Option<String>,
    ) -> Result<StageResult, Box<dyn Error>> {
        let batch_id = Uuid::new_v4().to_string();
        let total_rows = rows.len();

        let accepted: Vec<StagedRowInput> = match family {
            DocFamily::Issue => {
                let prefixes = self.config.get_issue_item_prefixes().await?;
                rows.into_iter()
                    .filter(|row| issue_prefix_allowed(row.item_code.as_deref(), &prefixes))
                    .collect()
            }
            DocFamily::Receipt => {
                let min_weight = self.config.get_receipt_min_unit_weight().await?;
                rows.into_iter()
                    .filter(|row| row.unit_weight > min_weight)
                    .collect()
            }
        };

        let staged = accepted.len();
        let filtered_out = total_rows - staged;

        let batch = StagingBatch {
            batch_id: batch_id.clone(),
            family,
            source_note,
            total_rows: total_rows as i64,
            staged_rows: staged as i64,
            filtered_rows: filtered_out as i64,
            staged_at: Utc::now(),
        };
        self.staging_repo.insert_batch_with_rows(&batch, &accepted)?;

        tracing::info!(
            batch_id = %batch_id,
            total_rows = total_rows,
            staged = staged,
            filtered_out = filtered_out,
            "暂存接收完成"
        );
        Ok(StageResult {
            batch_id,
            total_rows,
            staged,
            filtered_out,
        })
    }

    /// 清空指定单据族的暂存区
    ///
    /// # 返回
    /// - Ok(usize): 删除的暂存行数
    pub fn clear_staging(&self, family: DocFamily) -> Result<usize, Box<dyn Error>> {
        Ok(self.staging_repo.clear_family(family)?)
    }

    /// 指定单据族是否存在暂存行（界面"有临时数据"指示用）
    pub fn has_staged_rows(&self, family: DocFamily) -> Result<bool, Box<dyn Error>> {
        Ok(self.staging_repo.has_rows(family)?)
    }

    /// 指定单据族的暂存行数
    pub fn count_staged(&self, family: DocFamily) -> Result<i64, Box<dyn Error>> {
        Ok(self.staging_repo.count_for_family(family)?)
    }
}

/// 领料行准入: 物料编码非空且以白名单前缀之一开头（大小写不敏感）
fn issue_prefix_allowed(item_code: Option<&str>, prefixes: &[String]) -> bool {
    let Some(code) = item_code.map(str::trim).filter(|c| !c.is_empty()) else {
        return false;
    };
    let upper = code.to_uppercase();
    prefixes.iter().any(|prefix| upper.starts_with(prefix.as_str()))
}
