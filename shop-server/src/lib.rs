//! Atelier Shop Server - 定制缝纫品店铺的下单与交易核心
//!
//! # 架构概述
//!
//! 本模块是店铺后端的主入口，提供以下核心功能：
//!
//! - **购物车计价** (`pricing`): 每次读取都按当前目录数据重新计价
//! - **下单引擎** (`checkout`): 购物车 → 不可变订单的转换与支付状态机
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **外部协作方** (`services`): 物流/支付/通知/发票/内容配置
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! shop-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证
//! ├── money/         # 金额与增值税运算
//! ├── pricing/       # 购物车计价引擎
//! ├── checkout/      # 促销码、礼品卡、订单组装、生命周期
//! ├── services/      # 外部协作方 trait + HTTP 实现
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层
//! └── utils/         # 错误、日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod checkout;
pub mod core;
pub mod db;
pub mod money;
pub mod pricing;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResponse, AppResult};
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ___   __       ___
   /   | / /____  / (_)__  _____
  / /| |/ __/ _ \/ / / _ \/ ___/
 / ___ / /_/  __/ / /  __/ /
/_/  |_\__/\___/_/_/\___/_/
    "#
    );
}
