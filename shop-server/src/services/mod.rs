//! External collaborators behind narrow traits
//!
//! 核心只依赖这些 trait；生产实现都是薄的 HTTP/文件系统适配器：
//! - [`shipping`] - 承运商报价/面单聚合服务
//! - [`billing`] - 托管支付会话 + 签名 webhook
//! - [`notify`] - 邮件模板 + CRM 事件 (fire-and-forget)
//! - [`invoice`] - PDF 发票生成与存储
//! - [`offers`] - 内容配置（免邮门槛、赠品门槛、功能开关）
//! - [`media`] - 购物车预览图的存储与搬迁

pub mod billing;
pub mod invoice;
pub mod media;
pub mod notify;
pub mod offers;
pub mod shipping;

#[cfg(test)]
pub mod mock;

use std::sync::Arc;

use thiserror::Error;

pub use billing::{BillingService, BillingSession, CompletedSession, SessionLineItem};
pub use invoice::InvoiceService;
pub use media::MediaStore;
pub use notify::Notifier;
pub use offers::{OffersProvider, ShopOffers};
pub use shipping::ShippingService;

use crate::core::Config;

/// Collaborator failure, before any interpretation by the commerce core
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} service unreachable: {1}")]
    Unreachable(&'static str, String),

    #[error("{0} service rejected the request: {1}")]
    Rejected(&'static str, String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<ServiceError> for crate::utils::AppError {
    fn from(err: ServiceError) -> Self {
        tracing::error!(error = %err, "Collaborator failure");
        crate::utils::AppError::Internal(err.to_string())
    }
}

/// Bundle of collaborator handles carried by the server state
#[derive(Clone)]
pub struct Services {
    pub shipping: Arc<dyn ShippingService>,
    pub billing: Arc<dyn BillingService>,
    pub notifier: Arc<dyn Notifier>,
    pub invoices: Arc<dyn InvoiceService>,
    pub offers: Arc<dyn OffersProvider>,
    pub media: Arc<dyn MediaStore>,
}

impl Services {
    /// Wire the production implementations from the configuration
    pub fn production(config: &Config) -> Self {
        let fallback_offers = ShopOffers::from_config(config);
        let offers: Arc<dyn OffersProvider> = match &config.offers_cms_url {
            Some(url) => Arc::new(offers::HttpOffersProvider::new(
                url.clone(),
                fallback_offers,
            )),
            None => Arc::new(offers::StaticOffers::new(fallback_offers)),
        };

        Self {
            shipping: Arc::new(shipping::HttpShippingService::new(
                config.shipping_api_url.clone(),
                config.shipping_api_key.clone(),
            )),
            billing: Arc::new(billing::HttpBillingService::new(
                config.billing_api_url.clone(),
                config.billing_secret_key.clone(),
                config.checkout_success_url.clone(),
                config.checkout_cancel_url.clone(),
            )),
            notifier: Arc::new(notify::HttpNotifier::new(
                config.notify_api_url.clone(),
                config.notify_api_key.clone(),
            )),
            invoices: Arc::new(invoice::HttpInvoiceService::new(
                config.invoice_api_url.clone(),
                config.invoice_api_key.clone(),
            )),
            offers,
            media: Arc::new(media::FsMediaStore::new(config.media_dir())),
        }
    }
}
