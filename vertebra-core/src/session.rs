//! Caller sessions and group-membership authorization

use serde::{Deserialize, Serialize};

/// Remote caller context attached to a spine query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Authenticated user, if the transport knows it
    #[serde(default)]
    pub user_id: Option<String>,
    /// Groups the caller belongs to
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Session {
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id: None,
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Returns true when `required_groups` is empty or shares at least one
/// group with `session_groups`.
pub fn authorized<S, R>(session_groups: &[S], required_groups: &[R]) -> bool
where
    S: AsRef<str>,
    R: AsRef<str>,
{
    if required_groups.is_empty() {
        return true;
    }

    required_groups
        .iter()
        .any(|required| session_groups.iter().any(|g| g.as_ref() == required.as_ref()))
}

/// Authorization for an optional session. A missing session is an
/// in-process caller and is always admitted.
pub fn session_authorized<R: AsRef<str>>(session: Option<&Session>, required_groups: &[R]) -> bool {
    match session {
        Some(session) => authorized(&session.groups, required_groups),
        None => true,
    }
}
