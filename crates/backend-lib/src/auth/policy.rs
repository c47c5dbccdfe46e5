//! Typed gate checks for handlers.
//!
//! `Authorized<CreateEvent>` in a handler signature authenticates the
//! caller and runs [`authorize`] for that resource and operation. As a
//! request-parts extractor it resolves before any body extractor, so a
//! denied caller never gets their payload validated or persisted.

use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::gate::{authorize, Operation, Resource};
use super::identity::Identity;
use crate::error::AppError;
use crate::{metrics, AppState};

/// A resource/operation pair checked by [`Authorized`].
pub trait Policy: Send + Sync + 'static {
    const RESOURCE: Resource;
    const OPERATION: Operation;
}

macro_rules! policies {
    ($($name:ident => $resource:ident, $operation:ident;)*) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Policy for $name {
                const RESOURCE: Resource = Resource::$resource;
                const OPERATION: Operation = Operation::$operation;
            }
        )*
    };
}

policies! {
    ReadEvent => Event, Read;
    CreateEvent => Event, Create;
    UpdateEvent => Event, Update;
    DeleteEvent => Event, Delete;
    JoinEvent => Event, Join;
    ReadGroup => Group, Read;
    CreateGroup => Group, Create;
    UpdateGroup => Group, Update;
    DeleteGroup => Group, Delete;
    JoinGroup => Group, Join;
}

/// An identity that passed the gate for policy `P`.
#[derive(Debug)]
pub struct Authorized<P> {
    pub identity: Identity,
    _policy: PhantomData<fn() -> P>,
}

impl<P> Deref for Authorized<P> {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.identity
    }
}

impl<P: Policy> FromRequestParts<Arc<AppState>> for Authorized<P> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;

        if let Err(denied) = authorize(&identity, P::RESOURCE, P::OPERATION) {
            tracing::warn!(
                user_id = %identity.user_id,
                resource = %P::RESOURCE,
                operation = %P::OPERATION,
                "authorization denied"
            );
            ::metrics::counter!(metrics::AUTHZ_DENIED).increment(1);
            return Err(denied.into());
        }

        Ok(Self {
            identity,
            _policy: PhantomData,
        })
    }
}
