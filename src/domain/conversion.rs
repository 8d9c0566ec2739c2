// ==========================================
// 备件仓库单据台账系统 - 转换结果模型
// ==========================================
// 用途: convert_batch 返回值;计数与批次号供调用方展示与审计
// ==========================================

use crate::domain::types::DocFamily;
use crate::i18n::{t, t_with_args};
use serde::{Deserialize, Serialize};

// ==========================================
// ConversionResult - 转换运行结果
// ==========================================
// 红线: "无数据可转"不是错误,batch_no = None 的零工作量结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub family: DocFamily,           // 本次运行的单据族
    pub batch_no: Option<i64>,       // 本次运行使用的批次号（零工作量时为 None）
    pub documents_committed: usize,  // 成功提交的单据数
    pub documents_skipped: usize,    // 因单据号重复而跳过的分组数
    pub lines_committed: usize,      // 成功提交的明细行数
    pub inventory_created: usize,    // 新建的库存台账项（入库族）
    pub inventory_updated: usize,    // 更新的库存台账项（入库族）
    pub core_returns_created: usize, // 新增/累加的应还记录数（领料族）
}

impl ConversionResult {
    /// 零工作量结果
    pub fn empty(family: DocFamily) -> Self {
        Self {
            family,
            batch_no: None,
            documents_committed: 0,
            documents_skipped: 0,
            lines_committed: 0,
            inventory_created: 0,
            inventory_updated: 0,
            core_returns_created: 0,
        }
    }

    /// 是否实际提交了任何单据
    pub fn committed_any(&self) -> bool {
        self.documents_committed > 0
    }

    /// 面向调用方的汇总消息（按当前 locale 渲染）
    pub fn summary_message(&self) -> String {
        let batch_no = match self.batch_no {
            Some(b) => b,
            None => {
                return t_with_args(
                    "conversion.no_staged_data",
                    &[("family", &t(self.family.display_key()))],
                );
            }
        };

        let mut msg = t_with_args(
            "conversion.success",
            &[
                ("documents", &self.documents_committed.to_string()),
                ("lines", &self.lines_committed.to_string()),
                ("batch", &batch_no.to_string()),
            ],
        );

        if self.documents_skipped > 0 {
            msg.push_str(&t_with_args(
                "conversion.skipped_suffix",
                &[("skipped", &self.documents_skipped.to_string())],
            ));
        }

        if self.family == DocFamily::Receipt {
            msg.push_str(&t_with_args(
                "conversion.inventory_suffix",
                &[
                    ("created", &self.inventory_created.to_string()),
                    ("updated", &self.inventory_updated.to_string()),
                ],
            ));
        } else if self.core_returns_created > 0 {
            msg.push_str(&t_with_args(
                "conversion.core_return_suffix",
                &[("created", &self.core_returns_created.to_string())],
            ));
        }

        msg
    }
}
