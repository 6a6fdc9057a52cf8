use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use frost_types::NodeId;
use rand::Rng;

pub const MIN_WEIGHT: f64 = 0.1;
const RTT_PENALTY_FACTOR: f64 = 0.1;
const EMA_ALPHA: f64 = 0.7;

/// Outcome of one HTTP round trip to a node, used to update its selection
/// weight. A transport-level failure (connect refused, timeout) is scored
/// the same as a 5xx — both indicate the node is currently unhealthy.
pub enum Outcome {
    Success { latency: Duration },
    ServerError,
    ClientError,
    Transport,
}

/// Coordinator-local EMA tracker for each node's selection weight (§4.8).
/// No locks are needed for the fan-out itself — only weight updates, which
/// happen strictly after each call resolves, touch this structure.
pub struct WeightTracker {
    weights: Mutex<HashMap<NodeId, f64>>,
}

impl WeightTracker {
    pub fn new(initial: impl IntoIterator<Item = NodeId>) -> Self {
        let weights = initial.into_iter().map(|id| (id, 1.0)).collect();
        Self {
            weights: Mutex::new(weights),
        }
    }

    pub fn weight(&self, id: &NodeId) -> f64 {
        self.weights
            .lock()
            .expect("weight tracker mutex poisoned")
            .get(id)
            .copied()
            .unwrap_or(MIN_WEIGHT)
    }

    pub fn record(&self, id: &NodeId, outcome: Outcome) {
        let mut weights = self.weights.lock().expect("weight tracker mutex poisoned");
        let w = weights.entry(id.clone()).or_insert(1.0);
        *w = match outcome {
            Outcome::ClientError => *w,
            Outcome::ServerError | Outcome::Transport => *w * RTT_PENALTY_FACTOR,
            Outcome::Success { latency } => {
                let perf = 1.0 / (latency.as_secs_f64() + 0.01);
                (1.0 - EMA_ALPHA) * *w + EMA_ALPHA * perf
            }
        }
        .max(MIN_WEIGHT);
    }

    /// A-Res weighted reservoir sampling: draws `count` distinct members
    /// from `candidates` with probability proportional to their current
    /// weight, via the key `U_i^(1/w_i)` and taking the top `count` keys.
    pub fn sample(&self, candidates: &[NodeId], count: usize, rng: &mut impl Rng) -> Vec<NodeId> {
        let mut keyed: Vec<(f64, &NodeId)> = candidates
            .iter()
            .map(|id| {
                let w = self.weight(id).max(MIN_WEIGHT);
                let u: f64 = rng.gen_range(f64::EPSILON..1.0);
                (u.powf(1.0 / w), id)
            })
            .collect();
        keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        keyed.into_iter().take(count).map(|(_, id)| id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_never_drops_below_floor() {
        let tracker = WeightTracker::new([NodeId::from("n1")]);
        for _ in 0..20 {
            tracker.record(&NodeId::from("n1"), Outcome::ServerError);
        }
        assert!(tracker.weight(&NodeId::from("n1")) >= MIN_WEIGHT);
    }

    /// Scenario E: a node that fails (server error or transport) has its
    /// weight multiplied by the 0.1 penalty factor.
    #[test]
    fn server_error_applies_penalty_factor() {
        let tracker = WeightTracker::new([NodeId::from("n1")]);
        let before = tracker.weight(&NodeId::from("n1"));
        tracker.record(&NodeId::from("n1"), Outcome::ServerError);
        assert!((tracker.weight(&NodeId::from("n1")) - before * 0.1).abs() < 1e-9);
    }

    #[test]
    fn client_error_does_not_change_weight() {
        let tracker = WeightTracker::new([NodeId::from("n1")]);
        let before = tracker.weight(&NodeId::from("n1"));
        tracker.record(&NodeId::from("n1"), Outcome::ClientError);
        assert_eq!(before, tracker.weight(&NodeId::from("n1")));
    }

    #[test]
    fn sample_returns_requested_count_without_duplicates() {
        let tracker = WeightTracker::new((1..=5).map(|i| NodeId::from(format!("n{i}").as_str())));
        let candidates: Vec<NodeId> = (1..=5).map(|i| NodeId::from(format!("n{i}").as_str())).collect();
        let mut rng = rand::thread_rng();
        let sampled = tracker.sample(&candidates, 3, &mut rng);
        assert_eq!(sampled.len(), 3);
        let unique: std::collections::HashSet<_> = sampled.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    /// Scenario D: with weights `[10.0, 10.0, 0.1]`, selecting 2 of 3 over
    /// 10,000 trials should pick the low-weight node in under 15% of them.
    #[test]
    fn low_weight_node_is_rarely_selected() {
        let a = NodeId::from("a");
        let b = NodeId::from("b");
        let low = NodeId::from("low");
        let tracker = WeightTracker::new([a.clone(), b.clone(), low.clone()]);
        {
            let mut weights = tracker.weights.lock().unwrap();
            weights.insert(a.clone(), 10.0);
            weights.insert(b.clone(), 10.0);
            weights.insert(low.clone(), 0.1);
        }
        let candidates = [a, b, low.clone()];
        let mut rng = rand::thread_rng();
        let trials = 10_000;
        let low_selections = (0..trials)
            .filter(|_| tracker.sample(&candidates, 2, &mut rng).contains(&low))
            .count();
        assert!(
            (low_selections as f64) / (trials as f64) < 0.15,
            "low-weight node selected {low_selections} / {trials} times"
        );
    }
}
