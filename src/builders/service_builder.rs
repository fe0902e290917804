//! Build an attendance service from engine configuration.

use std::sync::Arc;

use anyhow::{anyhow, Context};

use crate::config::EngineConfig;
use crate::core::{
    AppResult, AttendanceStore, AuditSink, InMemoryAuditSink, PromotionCoordinator,
    RoundAttendanceService,
};
use crate::util::clock::Clock;

/// Build the in-memory audit sink sized by [`EngineConfig::audit_buffer`].
pub fn build_audit_sink(cfg: &EngineConfig) -> InMemoryAuditSink {
    InMemoryAuditSink::new(cfg.audit_buffer)
}

/// Build a service over `store`, registering every configured round.
///
/// Rounds already present in the store are left untouched so a restarted
/// process can be pointed at existing data. Without an explicit `audit` sink
/// the service records into [`build_audit_sink`].
pub fn build_service<S, C>(
    cfg: &EngineConfig,
    store: S,
    clock: C,
    audit: Option<Arc<dyn AuditSink>>,
) -> AppResult<RoundAttendanceService<S, C>>
where
    S: AttendanceStore,
    C: Clock,
{
    cfg.validate().map_err(|e| anyhow!("config invalid: {e}"))?;

    let mut ids: Vec<&String> = cfg.rounds.keys().collect();
    ids.sort();
    for id in ids {
        let round = cfg.rounds[id].to_round(id);
        let existing = store
            .get_round(&round.id)
            .with_context(|| format!("loading round `{id}`"))?;
        if existing.is_some() {
            tracing::debug!(round = %round.id, "round already registered, keeping stored definition");
            continue;
        }
        store
            .insert_round(round)
            .with_context(|| format!("registering round `{id}`"))?;
    }

    let audit = audit.unwrap_or_else(|| {
        tracing::debug!(buffer = cfg.audit_buffer, "using in-memory audit sink");
        let sink: Arc<dyn AuditSink> = Arc::new(build_audit_sink(cfg));
        sink
    });
    let service = RoundAttendanceService::new(store, clock)
        .with_promotion(PromotionCoordinator::new(cfg.promotion_max_attempts))
        .with_audit(audit);
    tracing::info!(rounds = cfg.rounds.len(), "attendance service built");
    Ok(service)
}
