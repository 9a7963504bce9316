//! Per-request carrier of the resolved [`Identity`].
//!
//! The binding lives in a tokio task-local slot that only exists while a
//! future entered through [`TenantContext::scope`] is being polled. When that
//! future completes, fails or is dropped, the slot is gone with it, so a
//! worker can never observe a previous request's identity.
//!
//! Tasks spawned with `tokio::spawn` do not inherit the slot. Code running in
//! them sees [`Binding::Unset`] unless it opts in through
//! [`TenantContext::inherit`] or carries an [`Identity`] explicitly.

use std::cell::RefCell;
use std::future::Future;

use thiserror::Error;

use crate::identity::{Identity, Role, UserIdentity};
use crate::schema::TenantId;

tokio::task_local! {
    static CURRENT: RefCell<Binding>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Binding {
    #[default]
    Unset,
    Bound(Identity),
}

impl Binding {
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Bound(id) => Some(id),
            Self::Unset => None,
        }
    }

    #[must_use]
    pub fn into_identity(self) -> Option<Identity> {
        match self {
            Self::Bound(id) => Some(id),
            Self::Unset => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("no tenant context scope is active on this task")]
    NoScope,
}

pub struct TenantContext;

impl TenantContext {
    /// Run `fut` with a fresh, unset binding.
    pub async fn scope<F: Future>(fut: F) -> F::Output {
        CURRENT.scope(RefCell::new(Binding::Unset), fut).await
    }

    /// Run `fut` with `identity` already bound.
    pub async fn scope_with<F: Future>(identity: Identity, fut: F) -> F::Output {
        CURRENT.scope(RefCell::new(Binding::Bound(identity)), fut).await
    }

    /// Wrap `fut` so it runs with the caller's current binding.
    ///
    /// Intended for `tokio::spawn(TenantContext::inherit(work))` when
    /// background work has to stay on the request's tenant.
    pub fn inherit<F: Future>(fut: F) -> impl Future<Output = F::Output> {
        let binding = Self::get();
        CURRENT.scope(RefCell::new(binding), fut)
    }

    /// Overwrite the binding of the current scope.
    ///
    /// # Errors
    /// [`ContextError::NoScope`] when called outside [`TenantContext::scope`].
    pub fn set(identity: Identity) -> Result<(), ContextError> {
        CURRENT
            .try_with(|cell| *cell.borrow_mut() = Binding::Bound(identity))
            .map_err(|_| ContextError::NoScope)
    }

    /// Bind a clinic user.
    ///
    /// # Errors
    /// [`ContextError::NoScope`] when called outside [`TenantContext::scope`].
    pub fn bind_user(
        tenant_id: TenantId,
        role: Option<Role>,
        subject: impl Into<String>,
    ) -> Result<(), ContextError> {
        Self::set(Identity::User(UserIdentity::new(tenant_id, role, subject)))
    }

    /// Current binding. Outside any scope this is [`Binding::Unset`].
    #[must_use]
    pub fn get() -> Binding {
        CURRENT
            .try_with(|cell| cell.borrow().clone())
            .unwrap_or_default()
    }

    /// Reset to [`Binding::Unset`]. A no-op outside any scope.
    pub fn clear() {
        // Outside a scope there is nothing to clear.
        CURRENT
            .try_with(|cell| *cell.borrow_mut() = Binding::Unset)
            .unwrap_or_default();
    }

    /// Guard that calls [`TenantContext::clear`] when dropped.
    #[must_use]
    pub fn clear_on_drop() -> ClearGuard {
        ClearGuard(())
    }
}

#[must_use]
pub struct ClearGuard(());

impl Drop for ClearGuard {
    fn drop(&mut self) {
        TenantContext::clear();
    }
}
