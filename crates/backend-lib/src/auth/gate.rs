//! Role-based authorization for resource mutations.
//!
//! [`authorize`] is the single decision point: creating, updating or
//! deleting an [`Event`](Resource::Event) or a [`Group`](Resource::Group)
//! requires the admin role, everything else is open to any authenticated
//! identity. Object-level rules (self-or-admin, private visibility) live
//! with the handlers that own the object.

use std::fmt;

use thiserror::Error;

use super::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    User,
    Event,
    Group,
    Discussion,
    Message,
    Album,
    Photo,
    Comment,
    Poll,
    Vote,
    TicketType,
    Ticket,
    ShoppingItem,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::User => "user",
            Resource::Event => "event",
            Resource::Group => "group",
            Resource::Discussion => "discussion",
            Resource::Message => "message",
            Resource::Album => "album",
            Resource::Photo => "photo",
            Resource::Comment => "comment",
            Resource::Poll => "poll",
            Resource::Vote => "vote",
            Resource::TicketType => "ticket_type",
            Resource::Ticket => "ticket",
            Resource::ShoppingItem => "shopping_item",
        }
    }

    /// Mutations on these kinds are reserved for administrators.
    pub fn is_admin_gated(&self) -> bool {
        matches!(self, Resource::Event | Resource::Group)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    /// Joining or leaving as a member.
    Join,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Join => "join",
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Operation::Create | Operation::Update | Operation::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("administrator role required to {operation} {resource}")]
    AdminRequired {
        resource: Resource,
        operation: Operation,
    },
}

/// Decide whether `identity` may perform `operation` on `resource`.
pub fn authorize(
    identity: &Identity,
    resource: Resource,
    operation: Operation,
) -> Result<(), AuthorizationError> {
    if resource.is_admin_gated() && operation.is_mutation() && !identity.is_admin() {
        return Err(AuthorizationError::AdminRequired {
            resource,
            operation,
        });
    }
    Ok(())
}
