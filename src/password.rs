use std::fmt::{self, Debug, Formatter};

/// Password that keys the random placement strategies.
///
/// An empty string is no password at all, both key the placement with the
/// default seed. The secret never shows up in `Debug` output, not even its length.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Password(Option<String>);

impl Password {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Password(***)"),
            None => f.write_str("Password(None)"),
        }
    }
}

impl From<Option<String>> for Password {
    fn from(password: Option<String>) -> Self {
        Self(password.filter(|p| !p.is_empty()))
    }
}

impl From<String> for Password {
    fn from(password: String) -> Self {
        Some(password).into()
    }
}

impl From<&str> for Password {
    fn from(password: &str) -> Self {
        password.to_string().into()
    }
}
