// ==========================================
// 备件仓库单据台账系统 - 回收对账引擎集成测试
// ==========================================
// 测试范围: 回收登记/修改/删除,应还数量与已回收数量的同步,
//           预计重量快照,字段级校验
// ==========================================

mod helpers;

use chrono::NaiveDate;
use helpers::staged_row_builder::StagedRowBuilder;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use warehouse_ledger::domain::core_return::ReceiptInput;
use warehouse_ledger::domain::types::DocFamily;
use warehouse_ledger::engine::{ConversionEngine, EngineError, ReceiptReconciliationEngine};
use warehouse_ledger::repository::{CoreReturnRepository, DocumentRepository, ReceiptRepository};

// ==========================================
// 辅助函数
// ==========================================

fn setup() -> (NamedTempFile, Arc<Mutex<Connection>>) {
    let (temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let conn = test_helpers::open_shared_conn(&db_path).expect("打开数据库连接失败");
    (temp_file, conn)
}

/// 领料一张单(SP-1001 × 5),返回生成的明细行 ID（应还数量 5）
fn seed_issue_line(conn: &Arc<Mutex<Connection>>) -> i64 {
    let rows = vec![StagedRowBuilder::new("LL-9001")
        .line_no(1)
        .item("SP-1001", "齿轮泵")
        .qty_price(5.0, 0.0)
        .project_code("PRJ-A")
        .build()];
    test_helpers::stage_rows_directly(conn, DocFamily::Issue, &rows).expect("暂存失败");
    ConversionEngine::new(Arc::clone(conn))
        .convert_batch(DocFamily::Issue)
        .expect("领料转换失败");

    let doc_repo = DocumentRepository::new(Arc::clone(conn));
    let header = doc_repo
        .find_by_number(DocFamily::Issue, "LL-9001")
        .expect("查询失败")
        .expect("领料单应存在");
    let detail = doc_repo.get_detail(header.id).expect("查询失败").expect("应有明细");
    detail.lines[0].id
}

/// 入库一批 SP-1001,把库存均重推到 2.0
fn seed_inventory(conn: &Arc<Mutex<Connection>>, document_number: &str) {
    let rows = vec![StagedRowBuilder::new(document_number)
        .po_number("PO-1")
        .item("SP-1001", "齿轮泵")
        .qty_price(10.0, 5.0)
        .unit_weight(2.0)
        .build()];
    test_helpers::stage_rows_directly(conn, DocFamily::Receipt, &rows).expect("暂存失败");
    ConversionEngine::new(Arc::clone(conn))
        .convert_batch(DocFamily::Receipt)
        .expect("入库转换失败");
}

fn receipt_input(item_code: &str, qty: f64, line_id: Option<i64>) -> ReceiptInput {
    ReceiptInput {
        receipt_number: Some("HS-0001".to_string()),
        receipt_date: NaiveDate::from_ymd_opt(2025, 3, 20),
        item_code: item_code.to_string(),
        description: "齿轮泵".to_string(),
        qty,
        total_weight: qty * 2.1,
        project_code: "PRJ-A".to_string(),
        remarks: None,
        given_by: Some("王五".to_string()),
        received_by: "李四".to_string(),
        line_id,
    }
}

fn outstanding_of(conn: &Arc<Mutex<Connection>>, line_id: i64) -> f64 {
    CoreReturnRepository::new(Arc::clone(conn))
        .find_by_item_and_line("SP-1001", Some(line_id))
        .expect("查询应还记录失败")
        .expect("应还记录应存在")
        .outstanding_qty
}

fn received_of(conn: &Arc<Mutex<Connection>>, line_id: i64) -> f64 {
    DocumentRepository::new(Arc::clone(conn))
        .find_line(line_id)
        .expect("查询明细失败")
        .expect("明细应存在")
        .received_qty
}

fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "{}: 期望 {}, 实际 {}",
        what,
        expected,
        actual
    );
}

// ==========================================
// 登记
// ==========================================

#[test]
fn test_record_unlinked_receipt_without_inventory() {
    let (_temp_file, conn) = setup();
    let engine = ReceiptReconciliationEngine::new(Arc::clone(&conn));

    // 台账没有该物料: 均重快照为 0,预计重量为 0
    let receipt = engine
        .record_receipt(&receipt_input("SP-1001", 2.0, None))
        .expect("登记失败");

    assert!(receipt.id > 0);
    assert_eq!(receipt.receipt_number.as_deref(), Some("HS-0001"));
    assert_eq!(receipt.receipt_date, NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());
    assert_close(receipt.avg_unit_weight, 0.0, "均重快照");
    assert_close(receipt.expected_weight, 0.0, "预计重量");
    assert_close(receipt.total_weight, 4.2, "实测重量");
}

#[test]
fn test_expected_weight_snapshots_inventory_average() {
    let (_temp_file, conn) = setup();
    seed_inventory(&conn, "RK-9001");

    let engine = ReceiptReconciliationEngine::new(Arc::clone(&conn));
    let receipt = engine
        .record_receipt(&receipt_input("SP-1001", 3.0, None))
        .expect("登记失败");

    assert_close(receipt.avg_unit_weight, 2.0, "均重快照");
    assert_close(receipt.expected_weight, 6.0, "预计重量 = 数量 × 均重");
}

#[test]
fn test_linked_receipt_adjusts_outstanding_and_received() {
    let (_temp_file, conn) = setup();
    let line_id = seed_issue_line(&conn);
    assert_close(outstanding_of(&conn, line_id), 5.0, "初始应还");

    let engine = ReceiptReconciliationEngine::new(Arc::clone(&conn));
    let receipt = engine
        .record_receipt(&receipt_input("SP-1001", 2.0, Some(line_id)))
        .expect("登记失败");

    assert_eq!(receipt.line_id, Some(line_id));
    assert_close(outstanding_of(&conn, line_id), 3.0, "登记后应还");
    assert_close(received_of(&conn, line_id), 2.0, "登记后已回收");

    let receipts = ReceiptRepository::new(Arc::clone(&conn))
        .list_by_line(line_id)
        .expect("查询失败");
    assert_eq!(receipts.len(), 1);
}

#[test]
fn test_over_receipt_clamps_outstanding_at_zero() {
    let (_temp_file, conn) = setup();
    let line_id = seed_issue_line(&conn);

    let engine = ReceiptReconciliationEngine::new(Arc::clone(&conn));
    engine
        .record_receipt(&receipt_input("SP-1001", 99.0, Some(line_id)))
        .expect("登记失败");

    // 超量回收: 应还钳制在 0,已回收如实累计
    assert_close(outstanding_of(&conn, line_id), 0.0, "超量回收后应还");
    assert_close(received_of(&conn, line_id), 99.0, "超量回收后已回收");
}

// ==========================================
// 修改
// ==========================================

#[test]
fn test_update_receipt_applies_delta() {
    let (_temp_file, conn) = setup();
    let line_id = seed_issue_line(&conn);

    let engine = ReceiptReconciliationEngine::new(Arc::clone(&conn));
    let receipt = engine
        .record_receipt(&receipt_input("SP-1001", 2.0, Some(line_id)))
        .expect("登记失败");

    // 2 → 3: 只把差额 1 同步出去
    let updated = engine
        .update_receipt(receipt.id, &receipt_input("SP-1001", 3.0, Some(line_id)))
        .expect("修改失败");
    assert_close(updated.qty, 3.0, "修改后数量");
    assert_close(outstanding_of(&conn, line_id), 2.0, "修改后应还");
    assert_close(received_of(&conn, line_id), 3.0, "修改后已回收");

    // 数量不变的修改不动台账
    engine
        .update_receipt(receipt.id, &receipt_input("SP-1001", 3.0, Some(line_id)))
        .expect("修改失败");
    assert_close(outstanding_of(&conn, line_id), 2.0, "等量修改后应还");
    assert_close(received_of(&conn, line_id), 3.0, "等量修改后已回收");

    // 3 → 1: 差额 -2 反向同步
    engine
        .update_receipt(receipt.id, &receipt_input("SP-1001", 1.0, Some(line_id)))
        .expect("修改失败");
    assert_close(outstanding_of(&conn, line_id), 4.0, "回调后应还");
    assert_close(received_of(&conn, line_id), 1.0, "回调后已回收");
}

#[test]
fn test_update_resnapshots_expected_weight() {
    let (_temp_file, conn) = setup();
    seed_inventory(&conn, "RK-9001");

    let engine = ReceiptReconciliationEngine::new(Arc::clone(&conn));
    let receipt = engine
        .record_receipt(&receipt_input("SP-1001", 2.0, None))
        .expect("登记失败");
    assert_close(receipt.expected_weight, 4.0, "登记时预计重量");

    // 又入库一批更重的同物料,均重 2.0 → 3.0
    let rows = vec![StagedRowBuilder::new("RK-9002")
        .po_number("PO-2")
        .item("SP-1001", "齿轮泵")
        .qty_price(10.0, 15.0)
        .unit_weight(4.0)
        .build()];
    test_helpers::stage_rows_directly(&conn, DocFamily::Receipt, &rows).expect("暂存失败");
    ConversionEngine::new(Arc::clone(&conn))
        .convert_batch(DocFamily::Receipt)
        .expect("入库转换失败");

    // 修改按当前库存状态重新快照
    let updated = engine
        .update_receipt(receipt.id, &receipt_input("SP-1001", 2.0, None))
        .expect("修改失败");
    assert_close(updated.avg_unit_weight, 3.0, "修改后均重快照");
    assert_close(updated.expected_weight, 6.0, "修改后预计重量");
}

// ==========================================
// 删除
// ==========================================

#[test]
fn test_delete_receipt_restores_quantities() {
    let (_temp_file, conn) = setup();
    let line_id = seed_issue_line(&conn);

    let engine = ReceiptReconciliationEngine::new(Arc::clone(&conn));
    let receipt = engine
        .record_receipt(&receipt_input("SP-1001", 2.0, Some(line_id)))
        .expect("登记失败");
    assert_close(outstanding_of(&conn, line_id), 3.0, "登记后应还");

    engine.delete_receipt(receipt.id).expect("删除失败");

    // 登记再删除 = 完全还原
    assert_close(outstanding_of(&conn, line_id), 5.0, "删除后应还");
    assert_close(received_of(&conn, line_id), 0.0, "删除后已回收");
    assert!(ReceiptRepository::new(Arc::clone(&conn))
        .find_by_id(receipt.id)
        .expect("查询失败")
        .is_none());
}

// ==========================================
// 校验与错误
// ==========================================

#[test]
fn test_validation_errors_collected_per_field() {
    let (_temp_file, conn) = setup();
    let engine = ReceiptReconciliationEngine::new(Arc::clone(&conn));

    let err = engine
        .record_receipt(&ReceiptInput::default())
        .expect_err("空输入必须被拒绝");

    match err {
        EngineError::Validation { fields } => {
            for field in [
                "receipt_date",
                "item_code",
                "description",
                "qty",
                "total_weight",
                "project_code",
                "received_by",
            ] {
                assert!(fields.contains_key(field), "缺少字段错误: {}", field);
            }
        }
        other => panic!("期望校验错误,实际: {:?}", other),
    }
}

#[test]
fn test_unknown_line_id_rejected_as_validation() {
    let (_temp_file, conn) = setup();
    let engine = ReceiptReconciliationEngine::new(Arc::clone(&conn));

    let err = engine
        .record_receipt(&receipt_input("SP-1001", 1.0, Some(9999)))
        .expect_err("未知明细行必须被拒绝");

    match err {
        EngineError::Validation { fields } => {
            assert!(fields.contains_key("line_id"));
        }
        other => panic!("期望校验错误,实际: {:?}", other),
    }
}

#[test]
fn test_unknown_receipt_id_not_found() {
    let (_temp_file, conn) = setup();
    let engine = ReceiptReconciliationEngine::new(Arc::clone(&conn));

    let err = engine
        .update_receipt(9999, &receipt_input("SP-1001", 1.0, None))
        .expect_err("未知记录必须报 NotFound");
    assert!(matches!(err, EngineError::NotFound { .. }));

    let err = engine.delete_receipt(9999).expect_err("未知记录必须报 NotFound");
    assert!(matches!(err, EngineError::NotFound { .. }));
}
