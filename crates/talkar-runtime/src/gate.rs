//! The start barrier.
//!
//! An experience starts once the assets are in, the scene is built and the
//! user has tapped. These complete in any order; whichever arrives last
//! opens the gate, and it opens only once.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Completion {
    AssetsLoaded,
    ElementsReady,
    UserTapped,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StartGate {
    assets_loaded: bool,
    elements_ready: bool,
    user_tapped: bool,
    fired: bool,
}

impl StartGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completion. Returns `true` exactly once: on the call that
    /// completes the set.
    pub fn complete(&mut self, completion: Completion) -> bool {
        match completion {
            Completion::AssetsLoaded => self.assets_loaded = true,
            Completion::ElementsReady => self.elements_ready = true,
            Completion::UserTapped => self.user_tapped = true,
        }
        if self.fired || !self.is_satisfied() {
            return false;
        }
        self.fired = true;
        true
    }

    pub fn is_complete(&self, completion: Completion) -> bool {
        match completion {
            Completion::AssetsLoaded => self.assets_loaded,
            Completion::ElementsReady => self.elements_ready,
            Completion::UserTapped => self.user_tapped,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.assets_loaded && self.elements_ready && self.user_tapped
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Completion; 3] = [
        Completion::AssetsLoaded,
        Completion::ElementsReady,
        Completion::UserTapped,
    ];

    #[test]
    fn test_fires_once_for_every_order() {
        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let mut gate = StartGate::new();
            let fired: Vec<bool> = order.iter().map(|&i| gate.complete(ALL[i])).collect();
            assert_eq!(fired, vec![false, false, true], "order {:?}", order);
            assert!(gate.has_fired());
        }
    }

    #[test]
    fn test_repeated_completion_does_not_refire() {
        let mut gate = StartGate::new();
        for c in ALL {
            gate.complete(c);
        }
        assert!(!gate.complete(Completion::UserTapped));
        assert!(!gate.complete(Completion::AssetsLoaded));
    }
}
