//! Prometheus metrics for the gateway.
//!
//! [`GatewayMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use capmint_types::{MintStatus, SequenceNumber};
use prometheus::{
    register_int_counter_vec_with_registry, register_int_gauge_with_registry, Encoder,
    IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

pub struct GatewayMetrics {
    pub registry: Registry,
    /// Mint requests by terminal status.
    pub mint_outcomes: IntCounterVec,
    /// Next sequence number the signer will hand out.
    pub next_sequence: IntGauge,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let mint_outcomes = register_int_counter_vec_with_registry!(
            Opts::new(
                "capmint_mint_outcomes_total",
                "Mint requests by terminal outcome"
            ),
            &["status"],
            registry
        )?;

        let next_sequence = register_int_gauge_with_registry!(
            Opts::new(
                "capmint_next_sequence",
                "Next sequence number of the signing identity"
            ),
            registry
        )?;

        // Every status shows up in the exposition from the start.
        for status in MintStatus::ALL {
            mint_outcomes.with_label_values(&[status.as_str()]);
        }

        Ok(Self {
            registry,
            mint_outcomes,
            next_sequence,
        })
    }

    pub fn record_outcome(&self, status: MintStatus) {
        self.mint_outcomes.with_label_values(&[status.as_str()]).inc();
    }

    pub fn set_next_sequence(&self, sequence: SequenceNumber) {
        self.next_sequence
            .set(i64::try_from(sequence.value()).unwrap_or(i64::MAX));
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
