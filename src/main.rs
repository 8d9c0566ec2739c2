// ==========================================
// 备件仓库单据台账系统 - 运维命令行入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 代替外部调用方的最小操作面(暂存 / 转换 / 概览)
// ==========================================

use std::error::Error;
use std::sync::{Arc, Mutex};

use warehouse_ledger::config::{get_default_db_path, ConfigManager};
use warehouse_ledger::db::{init_schema, open_sqlite_connection, read_schema_version};
use warehouse_ledger::domain::types::DocFamily;
use warehouse_ledger::domain::StagedRowInput;
use warehouse_ledger::engine::{ConversionEngine, StagingIntake};
use warehouse_ledger::logging;
use warehouse_ledger::repository::{
    CoreReturnRepository, DocumentRepository, InventoryRepository, StagingRepository,
};

const USAGE: &str = "\
用法: warehouse-ledger <命令> [参数]

命令:
  init                      建库（已建库时仅校对 schema 版本）
  stage <族> <csv路径>      从 CSV 文件读取扁平行并暂存
  convert <族> [--json]     将暂存行转换为正式单据
  clear <族>                清空该族的暂存区
  status [--json]           暂存/单据/台账概览

族: receipt（入库单）| issue（领料单）
数据库路径取 WAREHOUSE_LEDGER_DB_PATH 环境变量,未设置时用用户数据目录。";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };
    let json_output = args.iter().any(|a| a == "--json");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    match command {
        "init" => {
            let version = {
                let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
                read_schema_version(&guard)?
            };
            println!("数据库就绪: {} (schema v{})", db_path, version.unwrap_or(0));
        }
        "stage" => {
            let family = parse_family_arg(args.get(2))?;
            let csv_path = args.get(3).ok_or("缺少参数: csv路径")?.to_string();

            let rows = read_staged_rows_csv(&csv_path)?;
            let staging_repo = Arc::new(StagingRepository::new(conn.clone()));
            let config = Arc::new(ConfigManager::from_connection(conn.clone())?);
            let intake = StagingIntake::new(staging_repo, config);

            let result = intake
                .stage_rows(family, rows, Some(csv_path.clone()))
                .await?;
            println!(
                "暂存完成: 批次 {} 提交 {} 行,暂存 {} 行,过滤 {} 行",
                result.batch_id, result.total_rows, result.staged, result.filtered_out
            );
        }
        "convert" => {
            let family = parse_family_arg(args.get(2))?;
            let engine = ConversionEngine::new(conn.clone());
            let result = engine.convert_batch(family)?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.summary_message());
            }
        }
        "clear" => {
            let family = parse_family_arg(args.get(2))?;
            let staging_repo = StagingRepository::new(conn.clone());
            let removed = staging_repo.clear_family(family)?;
            println!("已清空 {} 行暂存数据", removed);
        }
        "status" => {
            print_status(conn.clone(), json_output)?;
        }
        other => {
            eprintln!("未知命令: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn parse_family_arg(arg: Option<&String>) -> Result<DocFamily, Box<dyn Error>> {
    let raw = arg.ok_or("缺少参数: 单据族 (receipt | issue)")?;
    DocFamily::from_str(raw).ok_or_else(|| format!("无效单据族: {}", raw).into())
}

/// 读取扁平行 CSV（表头列名与 StagedRowInput 字段一致）
fn read_staged_rows_csv(path: &str) -> Result<Vec<StagedRowInput>, Box<dyn Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.deserialize::<StagedRowInput>() {
        rows.push(record?);
    }
    Ok(rows)
}

fn print_status(
    conn: Arc<Mutex<rusqlite::Connection>>,
    json_output: bool,
) -> Result<(), Box<dyn Error>> {
    let staging_repo = StagingRepository::new(conn.clone());
    let document_repo = DocumentRepository::new(conn.clone());
    let inventory_repo = InventoryRepository::new(conn.clone());
    let core_return_repo = CoreReturnRepository::new(conn);

    let inventory_count = inventory_repo.list()?.len();
    let core_stats = core_return_repo.stats()?;

    if json_output {
        let mut families = serde_json::Map::new();
        for family in [DocFamily::Receipt, DocFamily::Issue] {
            let staged = staging_repo.count_for_family(family)?;
            let stats = document_repo.stats(family)?;
            families.insert(
                family.to_db_str().to_lowercase(),
                serde_json::json!({ "staged_rows": staged, "documents": stats }),
            );
        }
        let payload = serde_json::json!({
            "families": families,
            "inventory_items": inventory_count,
            "core_returns": core_stats,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for family in [DocFamily::Receipt, DocFamily::Issue] {
        let staged = staging_repo.count_for_family(family)?;
        let stats = document_repo.stats(family)?;
        println!(
            "[{}] 暂存 {} 行 | 正式单据 {} 张 / {} 行,总重 {:.2}",
            family, staged, stats.document_count, stats.line_count, stats.total_weight
        );
    }

    println!(
        "库存台账 {} 项 | 应还记录 {} 条,应还总量 {:.2}",
        inventory_count, core_stats.record_count, core_stats.outstanding_total
    );
    Ok(())
}
