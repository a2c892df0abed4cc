//! Authorization decisions for content mutations.
//!
//! Everything here is a pure function of the acting identity and an
//! already-loaded post. Services consult it before touching storage.

use inkwell_common::{AppError, AppResult};
use inkwell_db::entities::{post, user};

/// The identity a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// No authenticated session.
    Anonymous,
    /// An authenticated user, by id.
    User(i32),
}

impl Actor {
    /// The user id, if authenticated.
    #[must_use]
    pub const fn user_id(&self) -> Option<i32> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(*id),
        }
    }

    /// Whether the actor is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl From<&user::Model> for Actor {
    fn from(user: &user::Model) -> Self {
        Self::User(user.id)
    }
}

impl From<Option<&user::Model>> for Actor {
    fn from(user: Option<&user::Model>) -> Self {
        user.map_or(Self::Anonymous, Self::from)
    }
}

/// A mutation on an existing post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Change title or body.
    Edit,
    /// Remove the post with its comments and likes.
    Delete,
    /// Add a comment.
    Comment,
    /// Toggle a like.
    Like,
}

/// Why a mutation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Authenticated, but not allowed on this post.
    Forbidden,
    /// Login required.
    Unauthenticated,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    /// Whether the action may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert a denial into the matching error.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(DenyReason::Forbidden) => Err(AppError::Forbidden),
            Self::Deny(DenyReason::Unauthenticated) => Err(AppError::Unauthenticated),
        }
    }
}

/// Decide whether `actor` may perform `action` on `post`.
///
/// Edit and delete are reserved to the owner. Commenting and liking are open
/// to any authenticated user, the owner included. Anonymous actors are
/// always sent to log in.
#[must_use]
pub const fn can_mutate(actor: Actor, post: &post::Model, action: Action) -> Decision {
    let Actor::User(user_id) = actor else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    match action {
        Action::Edit | Action::Delete => {
            if user_id == post.owner_id {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::Forbidden)
            }
        }
        Action::Comment | Action::Like => Decision::Allow,
    }
}

/// Decide whether `actor` may create a new post.
#[must_use]
pub const fn can_author(actor: Actor) -> Decision {
    match actor {
        Actor::User(_) => Decision::Allow,
        Actor::Anonymous => Decision::Deny(DenyReason::Unauthenticated),
    }
}
