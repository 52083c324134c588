//! Sharing a cart as a link.
//!
//! [`ShareFacade`] builds the link and copies it to a clipboard, falling back
//! to a second clipboard when the first one fails. [`ShareStatus`] tracks an
//! in-flight copy and a success flag that clears itself. [`SharedLinkNotice`]
//! tells the UI, once, that the cart came from someone else's link.

use crate::codec;
use crate::metrics::CART_SHARE_COPIES;
use crate::persistence::PersistenceAdapter;
use crate::providers::Clipboard;
use crate::store::CartStore;
use crate::types::{CartState, LoadOrigin, Tenant};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Builds share links and copies them to the clipboard.
///
/// `P` is the preferred clipboard (the async clipboard API in a browser) and
/// `F` the fallback (legacy select-and-copy).
pub struct ShareFacade<P, F> {
    persistence: Arc<PersistenceAdapter>,
    primary: P,
    fallback: F,
}

impl<P, F> ShareFacade<P, F>
where
    P: Clipboard,
    F: Clipboard,
{
    /// Create a facade over the given persistence adapter.
    #[must_use]
    pub const fn new(persistence: Arc<PersistenceAdapter>, primary: P, fallback: F) -> Self {
        Self {
            persistence,
            primary,
            fallback,
        }
    }

    /// Create a facade sharing `cart`'s persistence adapter.
    #[must_use]
    pub fn for_store(cart: &CartStore, primary: P, fallback: F) -> Self {
        Self::new(Arc::clone(&cart.environment().persistence), primary, fallback)
    }

    /// Link that recreates `state` for `tenant`.
    ///
    /// An empty cart returns the current URL unchanged. Otherwise the link is
    /// the current origin and path with only `tenant`'s cart parameter. Returns
    /// an empty string when the host has no location.
    #[must_use]
    pub fn build_share_url(&self, state: &CartState, tenant: &Tenant) -> String {
        let Some(mut url) = self.persistence.current_url() else {
            return String::new();
        };

        let token = codec::encode_at(&state.items, self.persistence.clock().now());
        if token.is_empty() {
            return url.to_string();
        }

        url.set_query(None);
        url.set_fragment(None);
        url.query_pairs_mut()
            .append_pair(&self.persistence.keys().url_param(tenant), &token);

        tracing::debug!(%tenant, items = state.items.len(), url_len = url.as_str().len(), "Built share link");
        url.to_string()
    }

    /// Copy the share link for `state` to the clipboard.
    ///
    /// Tries the primary clipboard, then the fallback. Returns whether either
    /// succeeded.
    pub async fn copy_to_clipboard(&self, state: &CartState, tenant: &Tenant) -> bool {
        let link = self.build_share_url(state, tenant);
        if link.is_empty() {
            tracing::warn!(%tenant, "No location to share");
            metrics::counter!(CART_SHARE_COPIES, "outcome" => "failed").increment(1);
            return false;
        }

        match self.primary.write_text(&link).await {
            Ok(()) => {
                tracing::debug!(%tenant, "Copied share link");
                metrics::counter!(CART_SHARE_COPIES, "outcome" => "primary").increment(1);
                return true;
            },
            Err(error) => {
                tracing::warn!(%tenant, %error, "Clipboard copy failed, trying fallback");
            },
        }

        match self.fallback.write_text(&link).await {
            Ok(()) => {
                tracing::debug!(%tenant, "Copied share link with fallback");
                metrics::counter!(CART_SHARE_COPIES, "outcome" => "fallback").increment(1);
                true
            },
            Err(error) => {
                tracing::error!(%tenant, %error, "Fallback clipboard copy failed");
                metrics::counter!(CART_SHARE_COPIES, "outcome" => "failed").increment(1);
                false
            },
        }
    }

    /// Copy the live cart's share link, recording progress in `status`.
    pub async fn share(&self, cart: &CartStore, status: &ShareStatus) -> bool {
        let state = cart.state();
        status
            .track(self.copy_to_clipboard(&state, &state.tenant))
            .await
    }
}

impl<P, F> std::fmt::Debug for ShareFacade<P, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareFacade")
            .field("persistence", &self.persistence)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct StatusFlags {
    is_sharing: bool,
    share_success: bool,
}

/// Progress of share-link copies.
///
/// `share_success` is set after a successful copy and cleared again after
/// the reset delay. Every copy schedules its own reset, independent of later
/// copies.
#[derive(Clone, Debug)]
pub struct ShareStatus {
    flags: Arc<Mutex<StatusFlags>>,
    reset_after: Duration,
}

impl ShareStatus {
    /// Default delay before `share_success` clears
    pub const DEFAULT_RESET: Duration = Duration::from_secs(3);

    /// Create a status that clears `share_success` after `reset_after`.
    #[must_use]
    pub fn new(reset_after: Duration) -> Self {
        Self {
            flags: Arc::new(Mutex::new(StatusFlags::default())),
            reset_after,
        }
    }

    /// Whether a copy is in progress.
    #[must_use]
    pub fn is_sharing(&self) -> bool {
        self.flags().is_sharing
    }

    /// Whether the last copy succeeded and the reset delay has not elapsed.
    #[must_use]
    pub fn share_success(&self) -> bool {
        self.flags().share_success
    }

    /// Run `copy`, flagging it as in progress, and record its result.
    ///
    /// Must be called inside a tokio runtime; the reset runs on a spawned task.
    pub async fn track(&self, copy: impl Future<Output = bool>) -> bool {
        self.flags().is_sharing = true;
        let success = copy.await;
        {
            let mut flags = self.flags();
            flags.is_sharing = false;
            flags.share_success = success;
        }

        let flags = Arc::clone(&self.flags);
        let delay = self.reset_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            flags
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .share_success = false;
            tracing::trace!("Share success flag reset");
        });

        success
    }

    fn flags(&self) -> std::sync::MutexGuard<'_, StatusFlags> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ShareStatus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RESET)
    }
}

/// Toast shown when a cart was loaded from a shared link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Headline.
    pub title: String,
    /// Detail line.
    pub description: String,
}

/// Announces a cart loaded from a shared link, once per session.
///
/// When it fires it also removes the tenant's cart parameter from the URL, so
/// a reload does not announce the same link again.
#[derive(Debug, Default)]
pub struct SharedLinkNotice {
    shown: AtomicBool,
}

impl SharedLinkNotice {
    /// Create a notice that has not fired yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            shown: AtomicBool::new(false),
        }
    }

    /// The notice to show, if `cart` came from a shared link and nothing has
    /// been shown yet in this session.
    pub fn check(&self, cart: &CartStore) -> Option<Notice> {
        let (tenant, lines) = cart.read(|state| {
            (state.load_origin == LoadOrigin::FromSharedLink && !state.is_empty())
                .then(|| (state.tenant.clone(), state.items.len()))
        })?;

        if self
            .shown
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        let persistence = &cart.environment().persistence;
        persistence.clear_url(&tenant, persistence.next_version());
        tracing::info!(%tenant, lines, "Announced cart loaded from shared link");

        Some(Notice {
            title: "Keranjang berhasil dimuat dari tautan!".to_string(),
            description: format!("{lines} item telah ditambahkan ke keranjang."),
        })
    }

    /// Whether the notice has fired.
    #[must_use]
    pub fn has_shown(&self) -> bool {
        self.shown.load(Ordering::Acquire)
    }

    /// Allow the notice to fire again.
    pub fn reset(&self) {
        self.shown.store(false, Ordering::Release);
    }
}
