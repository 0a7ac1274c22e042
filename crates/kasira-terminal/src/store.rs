//! # Cart Persistence
//!
//! The cart survives a browser refresh or terminal restart by writing a JSON
//! snapshot after every mutation. Persistence is an adapter behind the
//! [`CartStore`] trait so the session logic doesn't care whether the snapshot
//! lands in a file, local storage, or a test's memory.
//!
//! ## Failure Semantics
//! Cart mutations are infallible by contract, so a store failure never fails
//! the mutation. [`CartSession`] logs the failure and carries on with the
//! in-memory cart; a corrupt snapshot on startup is discarded the same way.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing::warn;

use kasira_core::Cart;

// =============================================================================
// Store Trait
// =============================================================================

/// Errors from a cart store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Snapshot decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A persistence backend for cart snapshots.
pub trait CartStore: Send + Sync {
    /// Loads the persisted snapshot, `None` when no snapshot exists.
    fn load(&self) -> Result<Option<Cart>, StoreError>;

    /// Overwrites the snapshot with the given cart.
    fn save(&self, cart: &Cart) -> Result<(), StoreError>;

    /// Removes the snapshot.
    fn clear(&self) -> Result<(), StoreError>;
}

// =============================================================================
// File Store
// =============================================================================

/// Stores the cart as a JSON file next to the terminal's data.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store at the given path. Nothing is touched until the first
    /// save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }
}

impl CartStore for JsonFileStore {
    fn load(&self) -> Result<Option<Cart>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let json = serde_json::to_string(cart)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-memory store for tests and headless use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl CartStore for MemoryStore {
    fn load(&self) -> Result<Option<Cart>, StoreError> {
        let guard = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let json = serde_json::to_string(cart)?;
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

// =============================================================================
// Cart Session
// =============================================================================

/// The live cart plus its persistence backend.
///
/// ## Thread Safety
/// The cart is behind a `Mutex` because concurrent terminal operations may
/// touch it; only one mutation runs at a time and each mutation persists the
/// resulting snapshot before releasing the lock.
pub struct CartSession<S: CartStore> {
    store: S,
    cart: Mutex<Cart>,
}

impl<S: CartStore> CartSession<S> {
    /// Creates a session, restoring the persisted cart when one exists.
    ///
    /// A missing or unreadable snapshot yields an empty cart; the terminal
    /// never refuses to start over a corrupt cart file.
    pub fn new(store: S) -> Self {
        let cart = match store.load() {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "Failed to restore cart snapshot, starting empty");
                Cart::new()
            }
        };

        CartSession {
            store,
            cart: Mutex::new(cart),
        }
    }

    /// Runs a read-only closure against the cart.
    pub fn with_cart<R>(&self, f: impl FnOnce(&Cart) -> R) -> R {
        let guard = self.cart.lock().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    /// Runs a mutation against the cart and persists the result.
    ///
    /// A persistence failure is logged, never surfaced: the in-memory cart is
    /// the source of truth until the next successful save.
    pub fn with_cart_mut<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> R {
        let mut guard = self.cart.lock().unwrap_or_else(|e| e.into_inner());
        let result = f(&mut guard);
        if let Err(e) = self.store.save(&guard) {
            warn!(error = %e, "Failed to persist cart snapshot");
        }
        result
    }

    /// Clones the current cart state.
    pub fn snapshot(&self) -> Cart {
        self.with_cart(|cart| cart.clone())
    }

    /// Empties the cart and removes the persisted snapshot.
    pub fn clear(&self) {
        let mut guard = self.cart.lock().unwrap_or_else(|e| e.into_inner());
        guard.clear();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear cart snapshot");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
