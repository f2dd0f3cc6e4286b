//! Global kill switch.

/// Environment variable that disables nsdep entirely when set to `1` or `true`.
pub const KILL_SWITCH_VAR: &str = "NSDEP_DISABLED";

/// Out-of-band switch that bypasses analysis.
///
/// The switch is read once at the start of every analysis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillSwitch {
    /// Engaged when the named environment variable is `1` or `true`.
    Env(String),
    /// Fixed state, used when the caller decides up front.
    Fixed(bool),
}

impl KillSwitch {
    /// Switch backed by [`KILL_SWITCH_VAR`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::Env(KILL_SWITCH_VAR.to_string())
    }

    /// Switch that is never engaged.
    #[must_use]
    pub fn off() -> Self {
        Self::Fixed(false)
    }

    /// Returns true if tooling is disabled right now.
    #[must_use]
    pub fn is_engaged(&self) -> bool {
        match self {
            Self::Fixed(engaged) => *engaged,
            Self::Env(var) => std::env::var(var).is_ok_and(|v| is_truthy(&v)),
        }
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::from_env()
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}
