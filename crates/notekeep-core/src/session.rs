//! Ambient authentication context.
//!
//! Login and logout happen elsewhere; this crate only needs to know who is
//! signed in, and the token to present to the data API on their behalf.

use crate::models::Note;

/// Current authentication state, injected into the controller and the
/// remote client at construction.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<String>,
    pub access_token: Option<String>,
}

impl Session {
    /// No user signed in. Everything is read-only.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            access_token: Some(access_token.into()),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some()
    }

    /// True if the signed-in user owns the note.
    pub fn can_edit(&self, note: &Note) -> bool {
        match (&self.user_id, &note.user_id) {
            (Some(me), Some(owner)) => me == owner,
            _ => false,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note_owned_by(owner: Option<&str>) -> Note {
        Note {
            id: "n".to_string(),
            title: "t".to_string(),
            description: None,
            color: None,
            image_url: None,
            checklist: vec![],
            tags: vec![],
            created_at: Utc::now(),
            user_id: owner.map(str::to_string),
        }
    }

    #[test]
    fn test_anonymous_is_read_only() {
        let session = Session::anonymous();
        assert!(!session.is_signed_in());
        assert!(!session.can_edit(&note_owned_by(Some("u1"))));
    }

    #[test]
    fn test_owner_can_edit() {
        let session = Session::signed_in("u1", "jwt");
        assert!(session.can_edit(&note_owned_by(Some("u1"))));
    }

    #[test]
    fn test_other_user_is_read_only() {
        let session = Session::signed_in("u2", "jwt");
        assert!(!session.can_edit(&note_owned_by(Some("u1"))));
        assert!(!session.can_edit(&note_owned_by(None)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::signed_in("u1", "secret-token");
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("u1"));
    }
}
