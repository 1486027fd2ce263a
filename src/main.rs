// ==========================================
// BOM 生产引擎 - 命令行入口
// ==========================================
// 用法:
//   bom-engine [--db PATH] init
//   bom-engine [--db PATH] resolve <recipe_id> <quantity>
//   bom-engine [--db PATH] can-produce <recipe_id> <quantity>
//   bom-engine [--db PATH] check <recipe_id> <quantity>
//   bom-engine [--db PATH] produce <recipe_id> <quantity> <actor> [note]
//   bom-engine [--db PATH] stock <product_id>
//   bom-engine [--db PATH] production <production_id>
// 输出: stdout 为 JSON; 日志写 stderr（RUST_LOG 控制级别）
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use bom_engine::api::ApiError;
use bom_engine::app::{get_default_db_path, AppState};
use bom_engine::db::read_schema_version;
use serde::Serialize;
use serde_json::json;

const USAGE: &str = "usage: bom-engine [--db PATH] <init|resolve|can-produce|check|produce|stock|production> [args...]";

fn main() -> Result<()> {
    match std::env::var("BOM_ENGINE_LOG_FORMAT").as_deref() {
        Ok("json") => bom_engine::logging::init_json(),
        _ => bom_engine::logging::init(),
    }

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let db_path = match args.iter().position(|a| a == "--db") {
        Some(idx) => {
            if idx + 1 >= args.len() {
                bail!("--db 缺少路径参数\n{}", USAGE);
            }
            let path = args.remove(idx + 1);
            args.remove(idx);
            path
        }
        None => get_default_db_path(),
    };

    let command = args.first().cloned().ok_or_else(|| anyhow!(USAGE))?;
    tracing::debug!(command = %command, db_path = %db_path, "{} v{}", bom_engine::APP_NAME, bom_engine::VERSION);

    let state = AppState::new(db_path.clone()).map_err(|e| anyhow!(e))?;
    let rest = &args[1..];

    let outcome = match command.as_str() {
        "init" => {
            let conn = state.connection();
            let version = {
                let guard = conn.lock().map_err(|e| anyhow!("数据库锁获取失败: {}", e))?;
                read_schema_version(&guard)?
            };
            emit(&json!({ "db_path": db_path, "schema_version": version }))
        }
        "resolve" => {
            let (recipe_id, quantity) = recipe_and_quantity(rest)?;
            render(state.production_api.resolve(recipe_id, quantity))
        }
        "can-produce" => {
            let (recipe_id, quantity) = recipe_and_quantity(rest)?;
            render(state.production_api.can_produce(recipe_id, quantity))
        }
        "check" => {
            let (recipe_id, quantity) = recipe_and_quantity(rest)?;
            render(state.production_api.check_stock(recipe_id, quantity))
        }
        "produce" => {
            let (recipe_id, quantity) = recipe_and_quantity(rest)?;
            let actor = rest.get(2).ok_or_else(|| anyhow!("produce 缺少 actor 参数"))?;
            let note = rest.get(3).map(|s| s.as_str());
            render(state.production_api.produce(recipe_id, quantity, actor, note))
        }
        "stock" => {
            let product_id = rest.first().ok_or_else(|| anyhow!("stock 缺少 product_id 参数"))?;
            render(state.stock_api.product_summary(product_id))
        }
        "production" => {
            let production_id = rest
                .first()
                .ok_or_else(|| anyhow!("production 缺少 production_id 参数"))?;
            render(state.production_api.get_production(production_id))
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(CliFailure::Api(code)) => std::process::exit(code),
        Err(CliFailure::Output(err)) => Err(err),
    }
}

enum CliFailure {
    // 业务错误已以 JSON 输出,携带退出码
    Api(i32),
    Output(anyhow::Error),
}

fn recipe_and_quantity(rest: &[String]) -> Result<(&str, f64)> {
    let recipe_id = rest.first().ok_or_else(|| anyhow!("缺少 recipe_id 参数"))?;
    let raw = rest.get(1).ok_or_else(|| anyhow!("缺少 quantity 参数"))?;
    let quantity = raw
        .parse::<f64>()
        .with_context(|| format!("quantity 不是数字: {}", raw))?;
    Ok((recipe_id.as_str(), quantity))
}

fn emit<T: Serialize>(value: &T) -> std::result::Result<(), CliFailure> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliFailure::Output(e.into()))?;
    println!("{}", text);
    Ok(())
}

fn render<T: Serialize>(result: Result<T, ApiError>) -> std::result::Result<(), CliFailure> {
    match result {
        Ok(value) => emit(&value),
        Err(err) => {
            let mut body = json!({
                "error": err.to_string(),
                "retryable": err.is_retryable(),
            });
            if let ApiError::InsufficientStock(shortages) = &err {
                body["shortages"] = json!(shortages);
            }
            emit(&body)?;
            Err(CliFailure::Api(exit_code(&err)))
        }
    }
}

fn exit_code(err: &ApiError) -> i32 {
    match err {
        ApiError::InsufficientStock(_) => 2,
        ApiError::CycleDetected { .. } => 3,
        ApiError::ConcurrentModification(_) => 75,
        _ => 1,
    }
}
