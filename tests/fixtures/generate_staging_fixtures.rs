// ==========================================
// 暂存行测试数据生成器
// ==========================================
// 用途: 生成暂存接收/转换用的 CSV 数据集
// 输出: tests/fixtures/datasets/*.csv
//       表头为 StagedRowInput 字段名,可被运维入口 stage 命令直接读取
// ==========================================

use chrono::NaiveDate;
use csv::Writer;
use std::error::Error;
use std::fs::File;

use warehouse_ledger::domain::StagedRowInput;

fn main() -> Result<(), Box<dyn Error>> {
    println!("开始生成暂存数据集...");
    std::fs::create_dir_all("tests/fixtures/datasets")?;

    generate_receipt_normal()?;
    generate_receipt_rerun()?;
    generate_receipt_weightless()?;
    generate_issue_mixed_prefixes()?;

    println!("✓ 所有暂存数据集生成完成！");
    Ok(())
}

fn doc_date(day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2025, 3, day)
}

/// 正常入库数据: 10 张单据 × 3 行,物料在单据间复用以触发台账折算
fn generate_receipt_normal() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/receipt_normal.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    for doc in 0..10 {
        for line in 0..3 {
            let item_index = (doc + line) % 5;
            wtr.serialize(StagedRowInput {
                po_number: Some(format!("PO-2025-{:03}", doc / 2 + 1)),
                document_number: format!("RK-{:04}", doc + 1),
                line_no: Some(line as i64 + 1),
                document_date: doc_date(doc as u32 % 28 + 1),
                item_code: Some(format!("SP-{:04}", 1000 + item_index)),
                description: format!("备件-{}", item_index),
                qty: 2.0 + line as f64,
                unit_price: 10.0 + item_index as f64 * 5.0,
                amount: (2.0 + line as f64) * (10.0 + item_index as f64 * 5.0),
                uom: Some("件".to_string()),
                unit_weight: 1.5 + item_index as f64 * 0.5,
                warehouse: Some(["WH-A", "WH-B"][doc % 2].to_string()),
                ..Default::default()
            })?;
        }
    }

    wtr.flush()?;
    println!("✓ 生成 receipt_normal.csv (30行)");
    Ok(())
}

/// 重跑数据: 前 3 张单据号与 receipt_normal 重复,后 2 张为新单据
fn generate_receipt_rerun() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/receipt_rerun.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    for doc in 0..5 {
        let document_number = if doc < 3 {
            format!("RK-{:04}", doc + 1)
        } else {
            format!("RK-{:04}", 100 + doc)
        };
        wtr.serialize(StagedRowInput {
            po_number: Some("PO-2025-901".to_string()),
            document_number,
            line_no: Some(1),
            document_date: doc_date(20),
            item_code: Some("SP-1000".to_string()),
            description: "备件-0".to_string(),
            qty: 4.0,
            unit_price: 12.0,
            amount: 48.0,
            uom: Some("件".to_string()),
            unit_weight: 2.0,
            warehouse: Some("WH-A".to_string()),
            ..Default::default()
        })?;
    }

    wtr.flush()?;
    println!("✓ 生成 receipt_rerun.csv (5行,3行单据号重复)");
    Ok(())
}

/// 无重量入库数据: 单重为 0,接收时应全部被过滤
fn generate_receipt_weightless() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/receipt_weightless.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    for i in 0..4 {
        wtr.serialize(StagedRowInput {
            po_number: Some("PO-2025-777".to_string()),
            document_number: format!("RK-W{:03}", i + 1),
            line_no: Some(1),
            document_date: doc_date(10),
            item_code: Some(format!("SP-{:04}", 3000 + i)),
            description: "无重量行".to_string(),
            qty: 1.0,
            unit_price: 5.0,
            amount: 5.0,
            unit_weight: 0.0,
            ..Default::default()
        })?;
    }

    wtr.flush()?;
    println!("✓ 生成 receipt_weightless.csv (4行,应全部被过滤)");
    Ok(())
}

/// 领料数据: 三成物料编码不在白名单前缀内或为空
fn generate_issue_mixed_prefixes() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/issue_mixed_prefixes.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    let prefixes = ["SP-", "GT-", "UC-", "CO-", "XX-", ""];
    for i in 0..24 {
        let prefix = prefixes[i % prefixes.len()];
        let item_code = if prefix.is_empty() {
            None
        } else {
            Some(format!("{}{:04}", prefix, 2000 + i))
        };
        wtr.serialize(StagedRowInput {
            document_number: format!("LL-{:04}", i / 4 + 1),
            line_no: Some((i % 4) as i64 + 1),
            document_date: doc_date(15),
            item_code,
            description: format!("领用物料-{}", i),
            qty: 1.0 + (i % 3) as f64,
            wo_number: Some(format!("WO-{:03}", i / 4 + 1)),
            unit_no: Some(format!("{}#机组", i / 8 + 1)),
            project_code: Some(["PRJ-A", "PRJ-B"][i % 2].to_string()),
            ..Default::default()
        })?;
    }

    wtr.flush()?;
    println!("✓ 生成 issue_mixed_prefixes.csv (24行,含白名单外前缀)");
    Ok(())
}
