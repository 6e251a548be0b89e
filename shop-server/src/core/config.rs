use std::path::PathBuf;

use crate::auth::JwtConfig;

/// 服务器配置 - 店铺后端的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/atelier | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | VAT_RATE | 20 | 增值税率 (%) |
/// | ENVIRONMENT | development | 运行环境 |
/// | BILLING_API_URL | - | 支付会话服务地址 |
/// | SHIPPING_API_URL | - | 承运商聚合服务地址 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/atelier HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、媒体文件、日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// JWT 认证配置
    pub jwt: JwtConfig,

    // === 商务配置 ===
    /// 增值税率 (百分比，法国 20%)
    pub vat_rate: f64,
    /// 免邮门槛 (折后小计，不含礼品卡)
    pub free_shipping_threshold: Option<f64>,
    /// 免邮适用承运商
    pub free_shipping_carrier: String,
    /// 免邮适用国家
    pub free_shipping_countries: Vec<String>,
    /// 赠品门槛
    pub gift_threshold: Option<f64>,
    /// 定制商品开关
    pub customized_enabled: bool,
    /// 加急制作开关
    pub reduced_lead_time_enabled: bool,
    /// 加急制作价格 (含税)
    pub reduced_lead_time_price: f64,
    /// 默认制作周期 (天)
    pub default_lead_time_days: i32,
    /// 管理员通知邮箱
    pub admin_email: String,

    // === 外部服务 ===
    /// 支付会话服务
    pub billing_api_url: String,
    pub billing_secret_key: String,
    /// Webhook 签名密钥
    pub billing_webhook_secret: String,
    /// 支付完成后的跳转地址
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    /// 承运商聚合服务
    pub shipping_api_url: String,
    pub shipping_api_key: String,
    /// 邮件/CRM 网关
    pub notify_api_url: String,
    pub notify_api_key: String,
    /// 发票生成服务
    pub invoice_api_url: String,
    pub invoice_api_key: String,
    /// 内容配置 CMS (为空时使用本地默认值)
    pub offers_cms_url: Option<String>,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: env_or("WORK_DIR", "/var/lib/atelier"),
            http_port: env_parsed("HTTP_PORT", 3000),
            environment: env_or("ENVIRONMENT", "development"),
            jwt: JwtConfig::default(),

            vat_rate: env_parsed("VAT_RATE", 20.0),
            free_shipping_threshold: std::env::var("FREE_SHIPPING_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok()),
            free_shipping_carrier: env_or("FREE_SHIPPING_CARRIER", "COLISSIMO"),
            free_shipping_countries: env_or("FREE_SHIPPING_COUNTRIES", "FR")
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            gift_threshold: std::env::var("GIFT_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok()),
            customized_enabled: env_parsed("CUSTOMIZED_ENABLED", true),
            reduced_lead_time_enabled: env_parsed("REDUCED_LEAD_TIME_ENABLED", true),
            reduced_lead_time_price: env_parsed("REDUCED_LEAD_TIME_PRICE", 15.0),
            default_lead_time_days: env_parsed("DEFAULT_LEAD_TIME_DAYS", 21),
            admin_email: env_or("ADMIN_EMAIL", "atelier@localhost"),

            billing_api_url: env_or("BILLING_API_URL", "https://api.billing.example"),
            billing_secret_key: env_or("BILLING_SECRET_KEY", "sk_test_dev"),
            billing_webhook_secret: env_or("BILLING_WEBHOOK_SECRET", "whsec_dev"),
            checkout_success_url: env_or(
                "CHECKOUT_SUCCESS_URL",
                "http://localhost:5173/checkout/success",
            ),
            checkout_cancel_url: env_or(
                "CHECKOUT_CANCEL_URL",
                "http://localhost:5173/checkout/cancel",
            ),
            shipping_api_url: env_or("SHIPPING_API_URL", "https://api.shipping.example"),
            shipping_api_key: env_or("SHIPPING_API_KEY", "ship_test_dev"),
            notify_api_url: env_or("NOTIFY_API_URL", "https://api.notify.example"),
            notify_api_key: env_or("NOTIFY_API_KEY", "ntf_test_dev"),
            invoice_api_url: env_or("INVOICE_API_URL", "https://api.invoice.example"),
            invoice_api_key: env_or("INVOICE_API_KEY", "inv_test_dev"),
            offers_cms_url: std::env::var("OFFERS_CMS_URL").ok(),
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    pub fn media_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("media")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.media_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
