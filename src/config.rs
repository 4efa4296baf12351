use serde::{Deserialize, Serialize};

/// Knobs controlling how a [`Mocker`](crate::Mocker) resolves constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MockerOptions {
    /// Fill unregistered value parameters with `Default::default()`
    /// (zero, empty string, ...) instead of failing.
    pub default_values: bool,
    /// Consider constructors declared as non-public.
    pub non_public_constructors: bool,
}

impl Default for MockerOptions {
    fn default() -> Self {
        Self {
            default_values: false,
            non_public_constructors: true,
        }
    }
}

impl MockerOptions {
    pub fn with_default_values(mut self, enabled: bool) -> Self {
        self.default_values = enabled;
        self
    }

    pub fn with_non_public_constructors(mut self, enabled: bool) -> Self {
        self.non_public_constructors = enabled;
        self
    }
}
