// ==========================================
// 备件仓库单据台账系统 - 演示数据种子工具
// ==========================================
// 用途: 重置数据库并走一遍完整业务流
//       (暂存 → 转换 → 回收登记),生成可演示的台账数据
// ==========================================

use chrono::{Local, NaiveDate};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use warehouse_ledger::config::{get_default_db_path, ConfigManager};
use warehouse_ledger::db::{init_schema, open_sqlite_connection};
use warehouse_ledger::domain::types::DocFamily;
use warehouse_ledger::domain::{ReceiptInput, StagedRowInput};
use warehouse_ledger::engine::{ConversionEngine, ReceiptReconciliationEngine, StagingIntake};
use warehouse_ledger::repository::{CoreReturnRepository, DocumentRepository, StagingRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let staging_repo = Arc::new(StagingRepository::new(conn.clone()));
    let config = Arc::new(ConfigManager::from_connection(conn.clone())?);
    let intake = StagingIntake::new(staging_repo, config);
    let engine = ConversionEngine::new(conn.clone());

    // 入库单: 两张采购单,其中 PO-2025-001/RK-0001 两行折叠为一张单据
    let receipt_rows = demo_receipt_rows();
    let staged = intake
        .stage_rows(DocFamily::Receipt, receipt_rows, Some("seed_demo".to_string()))
        .await?;
    eprintln!("入库暂存: {} 行", staged.staged);
    let result = engine.convert_batch(DocFamily::Receipt)?;
    eprintln!("{}", result.summary_message());

    // 领料单: 含一行白名单之外的物料,应被准入过滤
    let issue_rows = demo_issue_rows();
    let staged = intake
        .stage_rows(DocFamily::Issue, issue_rows, Some("seed_demo".to_string()))
        .await?;
    eprintln!("领料暂存: {} 行（过滤 {} 行）", staged.staged, staged.filtered_out);
    let result = engine.convert_batch(DocFamily::Issue)?;
    eprintln!("{}", result.summary_message());

    // 对第一条应还记录登记一笔部分回收
    seed_one_receipt(conn.clone())?;

    print_quick_counts(conn)?;
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("已备份 {} -> {}", db_path, backup_path);
    Ok(())
}

fn demo_receipt_rows() -> Vec<StagedRowInput> {
    let doc_date = NaiveDate::from_ymd_opt(2025, 3, 3);
    vec![
        StagedRowInput {
            po_number: Some("PO-2025-001".to_string()),
            document_number: "RK-0001".to_string(),
            line_no: Some(1),
            document_date: doc_date,
            item_code: Some("SP-1001".to_string()),
            description: "齿轮泵".to_string(),
            qty: 10.0,
            unit_price: 5.0,
            amount: 50.0,
            uom: Some("台".to_string()),
            unit_weight: 2.0,
            warehouse: Some("WH-A".to_string()),
            ..Default::default()
        },
        StagedRowInput {
            po_number: Some("PO-2025-001".to_string()),
            document_number: "RK-0001".to_string(),
            line_no: Some(2),
            document_date: doc_date,
            item_code: Some("SP-1002".to_string()),
            description: "液压缸".to_string(),
            qty: 4.0,
            unit_price: 25.0,
            amount: 100.0,
            uom: Some("件".to_string()),
            unit_weight: 8.0,
            warehouse: Some("WH-A".to_string()),
            ..Default::default()
        },
        StagedRowInput {
            po_number: Some("PO-2025-002".to_string()),
            document_number: "RK-0002".to_string(),
            line_no: Some(1),
            document_date: doc_date,
            item_code: Some("SP-1001".to_string()),
            description: "齿轮泵".to_string(),
            qty: 10.0,
            unit_price: 15.0,
            amount: 150.0,
            uom: Some("台".to_string()),
            unit_weight: 4.0,
            warehouse: Some("WH-B".to_string()),
            ..Default::default()
        },
    ]
}

fn demo_issue_rows() -> Vec<StagedRowInput> {
    let doc_date = NaiveDate::from_ymd_opt(2025, 3, 5);
    vec![
        StagedRowInput {
            document_number: "LL-0001".to_string(),
            line_no: Some(1),
            document_date: doc_date,
            item_code: Some("SP-1001".to_string()),
            description: "齿轮泵".to_string(),
            qty: 3.0,
            wo_number: Some("WO-77".to_string()),
            unit_no: Some("1#机组".to_string()),
            project_code: Some("PRJ-A".to_string()),
            ..Default::default()
        },
        StagedRowInput {
            document_number: "LL-0001".to_string(),
            line_no: Some(2),
            document_date: doc_date,
            item_code: Some("GT-2001".to_string()),
            description: "辊道轴承".to_string(),
            qty: 6.0,
            wo_number: Some("WO-77".to_string()),
            unit_no: Some("1#机组".to_string()),
            project_code: Some("PRJ-A".to_string()),
            ..Default::default()
        },
        // 前缀不在白名单内,暂存时会被过滤
        StagedRowInput {
            document_number: "LL-0001".to_string(),
            line_no: Some(3),
            document_date: doc_date,
            item_code: Some("XX-9999".to_string()),
            description: "办公耗材".to_string(),
            qty: 1.0,
            ..Default::default()
        },
    ]
}

/// 对第一张领料单的第一行登记一笔部分回收
fn seed_one_receipt(conn: Arc<Mutex<rusqlite::Connection>>) -> Result<(), Box<dyn Error>> {
    let core_return_repo = CoreReturnRepository::new(conn.clone());
    let document_repo = DocumentRepository::new(conn.clone());

    let Some(view) = core_return_repo.list()?.into_iter().last() else {
        eprintln!("没有应还记录,跳过回收登记");
        return Ok(());
    };
    let Some(line_id) = view.record.line_id else {
        return Ok(());
    };
    let line = document_repo
        .find_line(line_id)?
        .ok_or("应还记录关联的明细行不存在")?;

    let reconciliation = ReceiptReconciliationEngine::new(conn);
    let receipt = reconciliation.record_receipt(&ReceiptInput {
        receipt_number: Some("HS-0001".to_string()),
        receipt_date: NaiveDate::from_ymd_opt(2025, 3, 20),
        item_code: view.record.item_code.clone(),
        description: line.description.clone(),
        qty: 1.0,
        total_weight: 2.1,
        project_code: view.record.project_code.clone().unwrap_or_default(),
        remarks: Some("演示数据".to_string()),
        given_by: Some("王五".to_string()),
        received_by: "李四".to_string(),
        line_id: Some(line_id),
    })?;
    eprintln!(
        "回收登记: #{} {} x{:.0},预计重量 {:.2}",
        receipt.id, receipt.item_code, receipt.qty, receipt.expected_weight
    );
    Ok(())
}

fn print_quick_counts(conn: Arc<Mutex<rusqlite::Connection>>) -> Result<(), Box<dyn Error>> {
    let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

    for table in [
        "staging_rows",
        "staging_batches",
        "documents",
        "document_lines",
        "inventory_ledger",
        "core_returns",
        "core_return_receipts",
    ] {
        let count: i64 =
            guard.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
        eprintln!("{:24} {}", table, count);
    }
    Ok(())
}
