//! Status enums for client-side flows.

use serde::{Deserialize, Serialize};

/// Caller-visible state of the checkout form.
///
/// `Idle --submit--> Submitting --accepted--> Placed`
/// `Submitting --rejected/network error--> Failed --submit--> Submitting`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// No submission attempted yet.
    #[default]
    Idle,
    /// A request is in flight.
    Submitting,
    /// The backend accepted the order; the cart has been cleared.
    Placed,
    /// The last attempt failed; the cart is untouched and a retry is allowed.
    Failed,
}

impl SubmissionStatus {
    /// Whether the submit control should be enabled.
    #[must_use]
    pub const fn can_submit(&self) -> bool {
        matches!(self, Self::Idle | Self::Failed)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Submitting => write!(f, "submitting"),
            Self::Placed => write!(f, "placed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// What to do when a cart line's quantity is set to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZeroQuantityPolicy {
    /// Keep the line with a quantity of one.
    #[default]
    Clamp,
    /// Delete the line, as if it had been removed.
    Remove,
}

impl std::fmt::Display for ZeroQuantityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clamp => write!(f, "clamp"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

impl std::str::FromStr for ZeroQuantityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clamp" => Ok(Self::Clamp),
            "remove" => Ok(Self::Remove),
            _ => Err(format!("invalid zero quantity policy: {s}")),
        }
    }
}
