//! Total-blocking-time results, observed or simulated
//!
//! A simulated result carries the predicted timing of every node in the
//! simulation graph. CPU nodes point back at the raw trace event of the
//! top-level task they model; network nodes never map to a task.

use crate::task_tree::EventRef;
use serde::{Deserialize, Serialize};

/// What a simulation node models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SimulationNodeKind {
    /// Main-thread work, backed by a top-level trace event
    Cpu { event: EventRef },
    /// A network request
    Network { url: String },
}

/// A node of the simulation graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationNode {
    pub id: u64,
    #[serde(flatten)]
    pub kind: SimulationNodeKind,
}

impl SimulationNode {
    pub fn cpu(id: u64, event: EventRef) -> Self {
        Self {
            id,
            kind: SimulationNodeKind::Cpu { event },
        }
    }

    pub fn network(id: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            kind: SimulationNodeKind::Network { url: url.into() },
        }
    }

    /// Raw event behind a CPU node
    pub fn cpu_event(&self) -> Option<EventRef> {
        match self.kind {
            SimulationNodeKind::Cpu { event } => Some(event),
            SimulationNodeKind::Network { .. } => None,
        }
    }
}

/// Predicted timing of one simulation node (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTiming {
    pub node: SimulationNode,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
}

impl NodeTiming {
    pub fn new(node: SimulationNode, start_time: f64, end_time: f64) -> Self {
        Self {
            node,
            start_time,
            end_time,
            duration: end_time - start_time,
        }
    }
}

/// Blocking-time metric result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockingTimeResult {
    /// Computed from the recorded trace
    Observed { timing: f64 },
    /// Computed from the pessimistic simulation run
    #[serde(rename_all = "camelCase")]
    Simulated {
        timing: f64,
        node_timings: Vec<NodeTiming>,
    },
}

impl BlockingTimeResult {
    pub fn timing(&self) -> f64 {
        match self {
            BlockingTimeResult::Observed { timing }
            | BlockingTimeResult::Simulated { timing, .. } => *timing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_event() {
        assert_eq!(
            SimulationNode::cpu(1, EventRef(9)).cpu_event(),
            Some(EventRef(9))
        );
        assert_eq!(
            SimulationNode::network(2, "https://example.com/app.js").cpu_event(),
            None
        );
    }

    #[test]
    fn test_deserialize_simulated_result() {
        let json = r#"{
            "kind": "simulated",
            "timing": 320,
            "nodeTimings": [
                {"node": {"id": 1, "type": "cpu", "event": 7}, "startTime": 0, "endTime": 2000, "duration": 2000},
                {"node": {"id": 2, "type": "network", "url": "https://a.test/x.js"}, "startTime": 0, "endTime": 90, "duration": 90}
            ]
        }"#;
        let result: BlockingTimeResult = serde_json::from_str(json).unwrap();
        let BlockingTimeResult::Simulated {
            timing,
            node_timings,
        } = result
        else {
            panic!("expected simulated result");
        };
        assert_eq!(timing, 320.0);
        assert_eq!(node_timings.len(), 2);
        assert_eq!(node_timings[0].node.cpu_event(), Some(EventRef(7)));
        assert_eq!(node_timings[1].node.cpu_event(), None);
    }

    #[test]
    fn test_observed_result() {
        let result = BlockingTimeResult::Observed { timing: 150.0 };
        assert_eq!(result.timing(), 150.0);
    }
}
