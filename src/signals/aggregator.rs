// =============================================================================
// Signal Aggregator — weighted-vote combiner producing ranked decisions
// =============================================================================
//
// Each evaluator contributes a weighted vote toward a cascade direction.
// Weights are relative: confidence is normalised by the total weight of the
// signals actually present for a coin, so a single strong signal can still
// clear the bar.  Disagreement between signals is penalised down to full
// cancellation when the two sides vote equally.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info};

use crate::signals::funding::FundingSignal;
use crate::signals::liquidation_map::LiquidationSignal;
use crate::signals::oi_divergence::OiSignal;
use crate::types::Direction;

/// Relative signal weights. They sum to 1.0 but are renormalised over the
/// signals present per coin.
pub const FUNDING_WEIGHT: f64 = 0.35;
pub const OI_DIVERGENCE_WEIGHT: f64 = 0.30;
pub const LIQUIDATION_WEIGHT: f64 = 0.35;

/// The signals that contributed to a decision, by kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActiveSignals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding: Option<FundingSignal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oi_divergence: Option<OiSignal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation: Option<LiquidationSignal>,
}

impl ActiveSignals {
    /// Names of the present signals, for compact logging.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.funding.is_some() {
            names.push("funding");
        }
        if self.oi_divergence.is_some() {
            names.push("oi_divergence");
        }
        if self.liquidation.is_some() {
            names.push("liquidation");
        }
        names
    }
}

/// A trade decision for one coin, one cycle. Consumed once by the executor.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub coin: String,
    pub direction: Direction,
    /// Normalised, conflict-adjusted agreement score in [0, 1].
    pub confidence: f64,
    pub signals: ActiveSignals,
    /// Liquidation cluster price, when a liquidation signal contributed.
    pub target_price: Option<f64>,
}

/// Combine the three per-coin signal maps into ranked trade decisions.
///
/// Output is sorted by confidence descending; coins below `min_confidence`
/// are dropped.  Exact direction-vote ties resolve to `Short`.
pub fn aggregate_signals(
    funding_signals: &HashMap<String, FundingSignal>,
    oi_signals: &HashMap<String, OiSignal>,
    liq_signals: &HashMap<String, LiquidationSignal>,
    min_confidence: f64,
) -> Vec<Decision> {
    // BTreeSet gives a fixed coin iteration order, which together with the
    // stable sort below makes the output fully deterministic.
    let all_coins: BTreeSet<&String> = funding_signals
        .keys()
        .chain(oi_signals.keys())
        .chain(liq_signals.keys())
        .collect();

    let mut decisions = Vec::new();

    for coin in all_coins {
        let mut long_votes = 0.0_f64;
        let mut short_votes = 0.0_f64;
        let mut total_weight = 0.0_f64;
        let mut active = ActiveSignals::default();

        let mut vote = |direction: Direction, amount: f64| match direction {
            Direction::Long => long_votes += amount,
            Direction::Short => short_votes += amount,
        };

        if let Some(sig) = funding_signals.get(coin) {
            vote(sig.direction, sig.strength * FUNDING_WEIGHT);
            total_weight += FUNDING_WEIGHT;
            active.funding = Some(sig.clone());
        }
        if let Some(sig) = oi_signals.get(coin) {
            vote(sig.direction, sig.strength * OI_DIVERGENCE_WEIGHT);
            total_weight += OI_DIVERGENCE_WEIGHT;
            active.oi_divergence = Some(sig.clone());
        }
        if let Some(sig) = liq_signals.get(coin) {
            vote(sig.direction, sig.strength * LIQUIDATION_WEIGHT);
            total_weight += LIQUIDATION_WEIGHT;
            active.liquidation = Some(sig.clone());
        }

        if total_weight == 0.0 {
            continue;
        }

        // Ties resolve to Short: Long needs strictly more votes.
        let (direction, chosen, opposing) = if long_votes > short_votes {
            (Direction::Long, long_votes, short_votes)
        } else {
            (Direction::Short, short_votes, long_votes)
        };

        let mut confidence = chosen / total_weight;

        // Conflict penalty: equal opposing votes cancel entirely.
        if opposing > 0.0 {
            confidence *= 1.0 - opposing / (chosen + opposing);
        }

        if confidence < min_confidence {
            debug!(
                coin = %coin,
                confidence = format!("{confidence:.3}"),
                min_confidence,
                "confidence below cutoff"
            );
            continue;
        }

        let confidence = (confidence * 1000.0).round() / 1000.0;

        let target_price = active.liquidation.as_ref().map(|l| l.cluster_price);

        info!(
            coin = %coin,
            direction = %direction,
            confidence = format!("{confidence:.3}"),
            target_price = ?target_price,
            signals = ?active.names(),
            "trade decision"
        );

        decisions.push(Decision {
            coin: coin.clone(),
            direction,
            confidence,
            signals: active,
            target_price,
        });
    }

    decisions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    decisions
}
