//! Node lifecycle states.

use core::fmt;

/// Lifecycle state of a model node.
///
/// States are totally ordered and a node only ever moves forward:
/// `Registered < Discovered < Created < Realized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ModelState {
    /// Known to the registry; nothing has been computed yet.
    #[default]
    Registered,
    /// Its children and derived metadata may be discovered.
    Discovered,
    /// Its projected objects may be created.
    Created,
    /// Fully configured and ready to be viewed.
    Realized,
}

impl ModelState {
    /// All states in lifecycle order.
    pub const ALL: [ModelState; 4] = [
        ModelState::Registered,
        ModelState::Discovered,
        ModelState::Created,
        ModelState::Realized,
    ];

    /// Returns `true` if `self` is `other` or a later state.
    #[must_use]
    pub fn is_at_least(self, other: ModelState) -> bool {
        self >= other
    }

    /// Returns the state following `self`, if any.
    #[must_use]
    pub fn next(self) -> Option<ModelState> {
        match self {
            ModelState::Registered => Some(ModelState::Discovered),
            ModelState::Discovered => Some(ModelState::Created),
            ModelState::Created => Some(ModelState::Realized),
            ModelState::Realized => None,
        }
    }

    /// Iterates over the states strictly after `self`, up to and including
    /// `target`.
    pub fn steps_to(self, target: ModelState) -> impl Iterator<Item = ModelState> {
        Self::ALL
            .into_iter()
            .filter(move |state| *state > self && *state <= target)
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelState::Registered => "registered",
            ModelState::Discovered => "discovered",
            ModelState::Created => "created",
            ModelState::Realized => "realized",
        };
        f.write_str(name)
    }
}
