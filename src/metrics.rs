//! Prometheus counters for the engine

use crate::errors::{FairnessError, FairnessResult};
use crate::games::GameType;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Engine-owned registry; cloning shares the underlying counters
#[derive(Clone)]
pub struct EngineMetrics {
    registry: Registry,
    rounds_total: IntCounterVec,
    wins_total: IntCounterVec,
    seed_pairs_created_total: IntCounter,
    rotations_total: IntCounter,
    verification_failures_total: IntCounter,
    integrity_violations_total: IntCounter,
}

fn metrics_error(e: prometheus::Error) -> FairnessError {
    FairnessError::Configuration(format!("metrics registration failed: {}", e))
}

impl EngineMetrics {
    pub fn new() -> FairnessResult<Self> {
        let registry = Registry::new_custom(Some("fairroll".to_string()), None).map_err(metrics_error)?;

        let rounds_total = IntCounterVec::new(
            Opts::new("rounds_total", "Rounds derived, by game"),
            &["game"],
        )
        .map_err(metrics_error)?;
        let wins_total =
            IntCounterVec::new(Opts::new("wins_total", "Winning rounds, by game"), &["game"])
                .map_err(metrics_error)?;
        let seed_pairs_created_total =
            IntCounter::new("seed_pairs_created_total", "Seed pairs committed").map_err(metrics_error)?;
        let rotations_total =
            IntCounter::new("rotations_total", "Seed pairs revealed and replaced").map_err(metrics_error)?;
        let verification_failures_total = IntCounter::new(
            "verification_failures_total",
            "Claimed outcomes that did not recompute",
        )
        .map_err(metrics_error)?;
        let integrity_violations_total =
            IntCounter::new("integrity_violations_total", "Integrity violations raised")
                .map_err(metrics_error)?;

        registry.register(Box::new(rounds_total.clone())).map_err(metrics_error)?;
        registry.register(Box::new(wins_total.clone())).map_err(metrics_error)?;
        registry
            .register(Box::new(seed_pairs_created_total.clone()))
            .map_err(metrics_error)?;
        registry.register(Box::new(rotations_total.clone())).map_err(metrics_error)?;
        registry
            .register(Box::new(verification_failures_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(integrity_violations_total.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            rounds_total,
            wins_total,
            seed_pairs_created_total,
            rotations_total,
            verification_failures_total,
            integrity_violations_total,
        })
    }

    pub fn record_round(&self, game: GameType, is_win: bool) {
        let label = game.to_string();
        self.rounds_total.with_label_values(&[label.as_str()]).inc();
        if is_win {
            self.wins_total.with_label_values(&[label.as_str()]).inc();
        }
    }

    pub fn record_seed_pair_created(&self) {
        self.seed_pairs_created_total.inc();
    }

    pub fn record_rotation(&self) {
        self.rotations_total.inc();
    }

    pub fn record_verification(&self, valid: bool) {
        if !valid {
            self.verification_failures_total.inc();
        }
    }

    /// Counts the error if it is an integrity violation
    pub fn observe_error(&self, error: &FairnessError) {
        if matches!(error, FairnessError::IntegrityViolation(_)) {
            self.integrity_violations_total.inc();
        }
    }

    pub fn rounds(&self, game: GameType) -> u64 {
        self.rounds_total.with_label_values(&[game.to_string().as_str()]).get()
    }

    pub fn integrity_violations(&self) -> u64 {
        self.integrity_violations_total.get()
    }

    /// Text exposition format
    pub fn render(&self) -> FairnessResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer)
            .map_err(|e| FairnessError::Configuration(format!("metrics output not utf-8: {}", e)))
    }
}
