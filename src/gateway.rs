//! # Gateway Façade
//!
//! One configured object, two entry points: [`Gateway::purchase`] for the
//! outbound redirect and [`Gateway::complete_purchase`] for the inbound
//! callbacks. The gateway itself is just configuration glue — each call
//! clones the config into a request object, so a single `Gateway` shared
//! across threads never has contended state.

use crate::config::GatewayConfig;
use crate::message::complete::CompleteRequest;
use crate::message::purchase::{PurchaseOptions, PurchaseRequest};

/// A configured Digilink gateway.
#[derive(Clone, Debug)]
pub struct Gateway {
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Stage a purchase. The returned request carries its own stable
    /// timestamp; call [`PurchaseRequest::redirect`] to render and sign.
    pub fn purchase(&self, options: PurchaseOptions) -> PurchaseRequest {
        PurchaseRequest::new(self.config.clone(), options)
    }

    /// Stage completion of an inbound bank callback.
    pub fn complete_purchase(&self) -> CompleteRequest {
        CompleteRequest::new(self.config.clone())
    }
}
