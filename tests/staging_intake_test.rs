// ==========================================
// 备件仓库单据台账系统 - 暂存接收集成测试
// ==========================================
// 测试范围: 准入过滤（前缀白名单 / 单重下限）、批次审计、
//           暂存区清空与计数
// ==========================================

mod helpers;

use helpers::mock_config::MockConfig;
use helpers::staged_row_builder::StagedRowBuilder;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use warehouse_ledger::domain::types::DocFamily;
use warehouse_ledger::engine::{ConversionEngine, StagingIntake};
use warehouse_ledger::repository::StagingRepository;

// ==========================================
// 辅助函数
// ==========================================

fn setup(
    config: MockConfig,
) -> (
    NamedTempFile,
    Arc<Mutex<Connection>>,
    Arc<StagingRepository>,
    StagingIntake<MockConfig>,
) {
    let (temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let conn = test_helpers::open_shared_conn(&db_path).expect("打开数据库连接失败");
    let staging_repo = Arc::new(StagingRepository::new(Arc::clone(&conn)));
    let intake = StagingIntake::new(Arc::clone(&staging_repo), Arc::new(config));
    (temp_file, conn, staging_repo, intake)
}

// ==========================================
// 领料单准入: 前缀白名单
// ==========================================

#[tokio::test]
async fn test_issue_rows_filtered_by_prefix_whitelist() {
    let (_temp_file, _conn, staging_repo, intake) = setup(MockConfig::default());

    let rows = vec![
        StagedRowBuilder::new("LL-0001").item("SP-1001", "齿轮泵").build(),
        StagedRowBuilder::new("LL-0001").item("gt-100", "斗齿").build(),
        StagedRowBuilder::new("LL-0001").item("XX-999", "劳保手套").build(),
        StagedRowBuilder::new("LL-0001").no_item_code().build(),
        StagedRowBuilder::new("LL-0001").item("   ", "空编码").build(),
    ];
    let result = intake
        .stage_rows(DocFamily::Issue, rows, Some("issue.csv".to_string()))
        .await
        .expect("暂存失败");

    // SP- 与小写 gt- 通过,其余被过滤
    assert_eq!(result.total_rows, 5);
    assert_eq!(result.staged, 2);
    assert_eq!(result.filtered_out, 3);

    assert_eq!(
        staging_repo.count_for_family(DocFamily::Issue).expect("统计失败"),
        2
    );
    assert!(staging_repo.has_rows(DocFamily::Issue).expect("查询失败"));
    assert_eq!(intake.count_staged(DocFamily::Issue).expect("统计失败"), 2);
}

#[tokio::test]
async fn test_issue_prefix_whitelist_is_configurable() {
    let (_temp_file, _conn, _staging_repo, intake) = setup(MockConfig::with_prefixes(&["AA-"]));

    let rows = vec![
        StagedRowBuilder::new("LL-0002").item("AA-1", "专用件").build(),
        StagedRowBuilder::new("LL-0002").item("SP-1001", "齿轮泵").build(),
    ];
    let result = intake
        .stage_rows(DocFamily::Issue, rows, None)
        .await
        .expect("暂存失败");

    // 白名单换成 AA- 后,默认的 SP- 不再通过
    assert_eq!(result.staged, 1);
    assert_eq!(result.filtered_out, 1);
}

// ==========================================
// 入库单准入: 单重下限
// ==========================================

#[tokio::test]
async fn test_receipt_rows_filtered_by_min_unit_weight() {
    let (_temp_file, _conn, _staging_repo, intake) = setup(MockConfig::default());

    // 默认下限 0: 判定是严格大于,单重 0 的行被过滤
    let rows = vec![
        StagedRowBuilder::new("RK-0001").po_number("PO-1").unit_weight(0.0).build(),
        StagedRowBuilder::new("RK-0001").po_number("PO-1").unit_weight(0.5).build(),
    ];
    let result = intake
        .stage_rows(DocFamily::Receipt, rows, None)
        .await
        .expect("暂存失败");
    assert_eq!(result.staged, 1);
    assert_eq!(result.filtered_out, 1);
}

#[tokio::test]
async fn test_receipt_min_unit_weight_is_strict() {
    let (_temp_file, _conn, _staging_repo, intake) = setup(MockConfig::with_min_unit_weight(1.0));

    let rows = vec![
        StagedRowBuilder::new("RK-0002").po_number("PO-1").unit_weight(1.0).build(),
        StagedRowBuilder::new("RK-0002").po_number("PO-1").unit_weight(1.01).build(),
    ];
    let result = intake
        .stage_rows(DocFamily::Receipt, rows, None)
        .await
        .expect("暂存失败");

    // 等于下限不通过
    assert_eq!(result.staged, 1);
    assert_eq!(result.filtered_out, 1);
}

// ==========================================
// 批次审计
// ==========================================

#[tokio::test]
async fn test_batch_audit_row_records_counts() {
    let (_temp_file, _conn, staging_repo, intake) = setup(MockConfig::default());

    let rows = vec![
        StagedRowBuilder::new("LL-0003").item("SP-1001", "齿轮泵").build(),
        StagedRowBuilder::new("LL-0003").item("XX-1", "非备件").build(),
    ];
    let result = intake
        .stage_rows(DocFamily::Issue, rows, Some("2025-03领料.csv".to_string()))
        .await
        .expect("暂存失败");

    let batch = staging_repo
        .find_batch(&result.batch_id)
        .expect("查询批次失败")
        .expect("批次审计行应存在");
    assert_eq!(batch.family, DocFamily::Issue);
    assert_eq!(batch.source_note.as_deref(), Some("2025-03领料.csv"));
    assert_eq!(batch.total_rows, 2);
    assert_eq!(batch.staged_rows, 1);
    assert_eq!(batch.filtered_rows, 1);
}

#[tokio::test]
async fn test_fully_filtered_batch_still_audited() {
    let (_temp_file, _conn, staging_repo, intake) = setup(MockConfig::default());

    let rows = vec![
        StagedRowBuilder::new("LL-0004").item("XX-1", "非备件").build(),
        StagedRowBuilder::new("LL-0004").no_item_code().build(),
    ];
    let result = intake
        .stage_rows(DocFamily::Issue, rows, Some("rejected.csv".to_string()))
        .await
        .expect("暂存失败");

    // 一行未留也要留痕
    assert_eq!(result.staged, 0);
    assert_eq!(result.filtered_out, 2);
    assert!(!intake.has_staged_rows(DocFamily::Issue).expect("查询失败"));

    let batch = staging_repo
        .find_batch(&result.batch_id)
        .expect("查询批次失败")
        .expect("批次审计行应存在");
    assert_eq!(batch.staged_rows, 0);
    assert_eq!(batch.filtered_rows, 2);
}

// ==========================================
// 清空与隔离
// ==========================================

#[tokio::test]
async fn test_clear_staging_keeps_audit_rows() {
    let (_temp_file, _conn, staging_repo, intake) = setup(MockConfig::default());

    let rows = vec![
        StagedRowBuilder::new("LL-0005").item("SP-1001", "齿轮泵").build(),
        StagedRowBuilder::new("LL-0006").item("SP-1002", "轴承座").build(),
    ];
    let result = intake
        .stage_rows(DocFamily::Issue, rows, None)
        .await
        .expect("暂存失败");

    let cleared = intake.clear_staging(DocFamily::Issue).expect("清空失败");
    assert_eq!(cleared, 2);
    assert_eq!(intake.count_staged(DocFamily::Issue).expect("统计失败"), 0);

    // 批次审计不随暂存区清空
    assert!(staging_repo
        .find_batch(&result.batch_id)
        .expect("查询批次失败")
        .is_some());
}

#[tokio::test]
async fn test_families_are_isolated() {
    let (_temp_file, _conn, _staging_repo, intake) = setup(MockConfig::default());

    let rows = vec![StagedRowBuilder::new("RK-0001").po_number("PO-1").build()];
    intake
        .stage_rows(DocFamily::Receipt, rows, None)
        .await
        .expect("暂存失败");

    assert_eq!(intake.count_staged(DocFamily::Receipt).expect("统计失败"), 1);
    assert_eq!(intake.count_staged(DocFamily::Issue).expect("统计失败"), 0);

    // 清空领料族不影响入库族
    let cleared = intake.clear_staging(DocFamily::Issue).expect("清空失败");
    assert_eq!(cleared, 0);
    assert_eq!(intake.count_staged(DocFamily::Receipt).expect("统计失败"), 1);
}

// ==========================================
// 与转换引擎的衔接
// ==========================================

#[tokio::test]
async fn test_intake_then_convert_end_to_end() {
    let (_temp_file, conn, _staging_repo, intake) = setup(MockConfig::default());

    let rows = vec![
        StagedRowBuilder::new("LL-0010")
            .line_no(1)
            .item("SP-1001", "齿轮泵")
            .qty_price(3.0, 0.0)
            .build(),
        StagedRowBuilder::new("LL-0010")
            .line_no(2)
            .item("XX-1", "非备件")
            .qty_price(1.0, 0.0)
            .build(),
    ];
    intake
        .stage_rows(DocFamily::Issue, rows, None)
        .await
        .expect("暂存失败");

    let result = ConversionEngine::new(Arc::clone(&conn))
        .convert_batch(DocFamily::Issue)
        .expect("转换失败");

    // 被过滤的行没有进暂存区,也就不会出现在正式单据里
    assert_eq!(result.documents_committed, 1);
    assert_eq!(result.lines_committed, 1);
    assert_eq!(result.core_returns_created, 1);
}
