//! In-memory collaborator doubles for lifecycle and handler tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared::checkout::Address;
use shared::models::shipping::{PickupPoint, ShippingOffer};

use super::billing::{BillingService, BillingSession, SessionLineItem};
use super::invoice::InvoiceService;
use super::media::MediaStore;
use super::notify::Notifier;
use super::offers::{ShopOffers, StaticOffers};
use super::shipping::ShippingService;
use super::{ServiceError, ServiceResult, Services};
use crate::db::models::Order;

/// Fixed-price shipping quotes
pub struct MockShipping {
    pub price: f64,
}

#[async_trait]
impl ShippingService for MockShipping {
    async fn get_offers(
        &self,
        _country: &str,
        _weight_grams: i64,
    ) -> ServiceResult<Vec<ShippingOffer>> {
        Ok(vec![ShippingOffer {
            carrier: "COLISSIMO".to_string(),
            offer: "home".to_string(),
            name: "Colissimo home delivery".to_string(),
            price_tax_included: self.price,
            price_tax_excluded: self.price / 1.2,
            delivery_days: Some(3),
            pickup: false,
        }])
    }

    async fn get_price(
        &self,
        carrier: &str,
        offer: &str,
        _weight_grams: i64,
        _country: &str,
    ) -> ServiceResult<ShippingOffer> {
        Ok(ShippingOffer {
            carrier: carrier.to_string(),
            offer: offer.to_string(),
            name: "Mock offer".to_string(),
            price_tax_included: self.price,
            price_tax_excluded: self.price / 1.2,
            delivery_days: Some(3),
            pickup: false,
        })
    }

    async fn list_pickup_points(
        &self,
        _carrier: &str,
        _country: &str,
        _zip_code: &str,
    ) -> ServiceResult<Vec<PickupPoint>> {
        Ok(vec![])
    }

    async fn buy_shipping_label(
        &self,
        order_reference: i64,
        _carrier: &str,
        _offer: &str,
        _weight_grams: i64,
        _address: &Address,
        _pickup_point: Option<&str>,
    ) -> ServiceResult<String> {
        Ok(format!("https://labels.example/{order_reference}.pdf"))
    }
}

/// Records created/cancelled sessions; can simulate failures and expiry
#[derive(Default)]
pub struct MockBilling {
    pub created: Mutex<Vec<(i64, String)>>,
    pub cancelled: Mutex<Vec<String>>,
    pub fail_create: AtomicBool,
    pub expired: AtomicBool,
}

#[async_trait]
impl BillingService for MockBilling {
    async fn create_session(
        &self,
        order_reference: i64,
        customer_email: &str,
        _line_items: &[SessionLineItem],
        _discount_cents: i64,
        _gift_card_cents: i64,
    ) -> ServiceResult<BillingSession> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ServiceError::Unreachable(
                "billing",
                "connection refused".to_string(),
            ));
        }
        let id = format!("cs_{order_reference}");
        self.created
            .lock()
            .unwrap()
            .push((order_reference, customer_email.to_string()));
        Ok(BillingSession {
            id: id.clone(),
            url: format!("https://pay.example/{id}"),
        })
    }

    async fn is_session_expired(&self, _session_id: &str) -> ServiceResult<bool> {
        Ok(self.expired.load(Ordering::SeqCst))
    }

    async fn cancel_session(&self, session_id: &str) -> ServiceResult<()> {
        self.cancelled.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}

/// Records notifications
#[derive(Default)]
pub struct MockNotifier {
    pub emails: Mutex<Vec<(String, String)>>,
    pub events: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_email(
        &self,
        to: &str,
        template: &str,
        _context: &serde_json::Value,
    ) -> ServiceResult<()> {
        self.emails
            .lock()
            .unwrap()
            .push((to.to_string(), template.to_string()));
        Ok(())
    }

    async fn crm_event(&self, event: &str, _context: &serde_json::Value) -> ServiceResult<()> {
        self.events.lock().unwrap().push(event.to_string());
        Ok(())
    }
}

/// Counts generations; can simulate failure
#[derive(Default)]
pub struct MockInvoice {
    pub generated: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl InvoiceService for MockInvoice {
    async fn generate(&self, order: &Order) -> ServiceResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Unreachable(
                "invoice",
                "renderer down".to_string(),
            ));
        }
        self.generated.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://invoices.example/{}.pdf", order.reference))
    }
}

/// No-op media store
pub struct NoopMedia;

#[async_trait]
impl MediaStore for NoopMedia {
    async fn promote_cart_media(
        &self,
        _user: &str,
        _order_reference: i64,
    ) -> ServiceResult<Vec<String>> {
        Ok(vec![])
    }
}

/// Handles onto the mock collaborators for assertions
pub struct MockHandles {
    pub billing: Arc<MockBilling>,
    pub notifier: Arc<MockNotifier>,
    pub invoices: Arc<MockInvoice>,
}

/// A full mocked service bundle with default offers and €6.90 shipping
pub fn mocked_services(offers: ShopOffers) -> (Services, MockHandles) {
    let billing = Arc::new(MockBilling::default());
    let notifier = Arc::new(MockNotifier::default());
    let invoices = Arc::new(MockInvoice::default());

    let services = Services {
        shipping: Arc::new(MockShipping { price: 6.9 }),
        billing: billing.clone(),
        notifier: notifier.clone(),
        invoices: invoices.clone(),
        offers: Arc::new(StaticOffers::new(offers)),
        media: Arc::new(NoopMedia),
    };

    (
        services,
        MockHandles {
            billing,
            notifier,
            invoices,
        },
    )
}
