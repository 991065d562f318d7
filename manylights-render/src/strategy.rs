//! Rendering strategies and the mode that names them.

use std::fmt;
use std::str::FromStr;

use crate::error::RenderResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Every fragment loops over every live light.
    Naive,
    /// Single geometry pass shading with the fragment's cluster.
    ForwardPlus,
    /// G-buffer pass followed by a clustered full-screen resolve.
    ClusteredDeferred,
}

impl RenderMode {
    pub const ALL: [RenderMode; 3] = [
        RenderMode::Naive,
        RenderMode::ForwardPlus,
        RenderMode::ClusteredDeferred,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RenderMode::Naive => "naive",
            RenderMode::ForwardPlus => "forward-plus",
            RenderMode::ClusteredDeferred => "clustered-deferred",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "naive" => Ok(RenderMode::Naive),
            "forward-plus" | "forward+" | "forwardplus" => Ok(RenderMode::ForwardPlus),
            "clustered-deferred" | "deferred" => Ok(RenderMode::ClusteredDeferred),
            other => Err(format!(
                "unknown render mode '{other}' (expected naive, forward-plus or clustered-deferred)"
            )),
        }
    }
}

/// One way of turning the stage into a frame. `S` is the state the strategy
/// draws from; the renderer uses [`Stage`](crate::stage::Stage).
pub trait RenderStrategy<S> {
    fn mode(&self) -> RenderMode;

    /// Encodes and submits one frame.
    fn draw(&mut self, stage: &mut S) -> RenderResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names_round_trip() {
        for mode in RenderMode::ALL {
            assert_eq!(mode.label().parse::<RenderMode>().unwrap(), mode);
            assert_eq!(mode.to_string(), mode.label());
        }
    }

    #[test]
    fn test_mode_aliases() {
        assert_eq!("Forward+".parse::<RenderMode>().unwrap(), RenderMode::ForwardPlus);
        assert_eq!("deferred".parse::<RenderMode>().unwrap(), RenderMode::ClusteredDeferred);
        assert!("tiled".parse::<RenderMode>().is_err());
    }
}
