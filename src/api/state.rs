use std::sync::Arc;

use crate::{
    config::Settings,
    payments::PaymentGateway,
    service::ServiceContext,
};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        service_context: Arc<ServiceContext>,
        payment_gateway: Arc<dyn PaymentGateway>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            service_context,
            payment_gateway,
            settings,
        }
    }
}
