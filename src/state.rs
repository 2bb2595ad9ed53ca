use std::sync::Arc;

use crate::{
    config::Config,
    gateway::{PhonePeGateway, error::GatewayError},
    orders::OrderStore,
};

#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: PhonePeGateway,
    pub orders: Arc<dyn OrderStore>,
}

impl AppState {
    pub fn new(config: Arc<Config>, orders: Arc<dyn OrderStore>) -> Result<Self, GatewayError> {
        let gate = PhonePeGateway::new(config.clone())?;
        Ok(Self {
            config,
            gate,
            orders,
        })
    }
}
