use std::{collections::HashMap, fmt::Write as _};

use quad_core::Decision;

use super::core::{MetricsState, METRICS_STATE};

pub(crate) fn metrics_state() -> &'static MetricsState {
    METRICS_STATE.get_or_init(MetricsState::default)
}

pub(crate) fn render_metrics() -> String {
    let decisions = metrics_state()
        .decisions
        .lock()
        .map_or_else(|_| HashMap::new(), |guard| guard.clone());
    let rejected_queries = metrics_state()
        .rejected_queries
        .lock()
        .map_or_else(|_| HashMap::new(), |guard| guard.clone());

    let mut output = String::new();
    output.push_str(
        "# HELP quad_authorize_decisions_total Count of permission decisions by outcome and deciding step\n",
    );
    output.push_str("# TYPE quad_authorize_decisions_total counter\n");
    let mut decision_entries: Vec<_> = decisions.into_iter().collect();
    decision_entries.sort_by_key(|((outcome, reason), _)| (*outcome, *reason));
    for ((outcome, reason), value) in decision_entries {
        let _ = writeln!(
            output,
            "quad_authorize_decisions_total{{outcome=\"{outcome}\",reason=\"{reason}\"}} {value}"
        );
    }

    output.push_str(
        "# HELP quad_rejected_queries_total Count of authorization queries rejected at the boundary\n",
    );
    output.push_str("# TYPE quad_rejected_queries_total counter\n");
    let mut rejected_entries: Vec<_> = rejected_queries.into_iter().collect();
    rejected_entries.sort_by_key(|(reason, _)| *reason);
    for (reason, value) in rejected_entries {
        let _ = writeln!(
            output,
            "quad_rejected_queries_total{{reason=\"{reason}\"}} {value}"
        );
    }

    output
}

pub(crate) fn record_decision(decision: Decision) {
    let outcome = if decision.allowed { "allowed" } else { "denied" };
    if let Ok(mut counters) = metrics_state().decisions.lock() {
        let entry = counters
            .entry((outcome, decision.reason.as_str()))
            .or_insert(0);
        *entry += 1;
    }
}

pub(crate) fn record_rejected_query(reason: &'static str) {
    if let Ok(mut counters) = metrics_state().rejected_queries.lock() {
        let entry = counters.entry(reason).or_insert(0);
        *entry += 1;
    }
}
