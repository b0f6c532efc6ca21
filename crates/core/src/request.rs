//! Encode requests handed to the encoder.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{ResolvedSettings, Tier};

/// One pending rung of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RungOutput {
    /// Tier produced
    pub tier: Tier,

    /// Final output file
    pub target: PathBuf,

    /// Settings resolved for this tier
    pub settings: ResolvedSettings,
}

/// A single multi-output encode of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeRequest {
    /// Source media file
    pub source: PathBuf,

    /// Rungs still to produce, in ladder order
    pub outputs: Vec<RungOutput>,

    /// Number of passes shared by all rungs
    pub passes: u32,
}

impl EncodeRequest {
    /// The passes to run, in order.
    pub fn pass_plan(&self) -> impl Iterator<Item = Pass> {
        let count = self.passes.max(1);
        (1..=count).map(move |index| Pass { index, count })
    }

    /// Tiers carried by this request.
    pub fn tiers(&self) -> Vec<Tier> {
        self.outputs.iter().map(|o| o.tier).collect()
    }
}

/// Position of one invocation within a multi-pass encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pass {
    /// 1-based pass index
    pub index: u32,

    /// Total passes
    pub count: u32,
}

impl Pass {
    /// A lone pass.
    pub fn single() -> Self {
        Self { index: 1, count: 1 }
    }

    /// Only the final pass writes real outputs.
    pub fn is_final(&self) -> bool {
        self.index >= self.count
    }

    /// Whether the encoder needs pass-log arguments at all.
    pub fn is_multi(&self) -> bool {
        self.count > 1
    }
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.index, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_plan_marks_only_last_final() {
        let request = EncodeRequest {
            source: PathBuf::from("/m/a.mkv"),
            outputs: Vec::new(),
            passes: 3,
        };
        let plan: Vec<_> = request.pass_plan().collect();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.iter().filter(|p| p.is_final()).count(), 1);
        assert!(plan[2].is_final());
        assert_eq!(plan[0].to_string(), "1/3");
    }

    #[test]
    fn test_zero_passes_runs_once() {
        let request = EncodeRequest {
            source: PathBuf::from("/m/a.mkv"),
            outputs: Vec::new(),
            passes: 0,
        };
        let plan: Vec<_> = request.pass_plan().collect();
        assert_eq!(plan, vec![Pass::single()]);
        assert!(!plan[0].is_multi());
    }
}
