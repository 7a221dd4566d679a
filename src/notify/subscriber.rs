//! Callbacks invoked after every successful catalog swap.

use crate::catalog::TranslationCatalog;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

type Callback = Box<dyn Fn(&TranslationCatalog) + Send + Sync>;

/// Internal subscriber registry state.
#[derive(Default)]
struct RegistryInner {
    subscribers: Vec<(usize, Callback)>,
    next_id: usize,
}

/// Handle for a subscription that can be dropped to unsubscribe.
pub struct SubscriptionHandle {
    id: usize,
    registry: Weak<RwLock<RegistryInner>>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.write().subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Registry of reload listeners.
///
/// Request-handling code that derives data from the catalogs (rendered
/// templates, compiled plural rules) registers here to drop it when a new
/// catalog is swapped in. Callbacks run on the reloading task, in
/// subscription order, and must not subscribe or unsubscribe themselves.
///
/// # Examples
///
/// ```rust
/// use catalog_sync::catalog::TranslationCatalog;
/// use catalog_sync::notify::SubscriberRegistry;
///
/// let registry = SubscriberRegistry::new();
/// let handle = registry.subscribe(|catalog| {
///     println!("now serving {} locales", catalog.stats().locales);
/// });
///
/// registry.notify_all(&TranslationCatalog::empty());
/// drop(handle);
/// assert_eq!(registry.subscriber_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl SubscriberRegistry {
    /// Create a new subscriber registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Drop the returned handle to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&TranslationCatalog) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Box::new(callback)));

        SubscriptionHandle {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every callback with the newly active catalog.
    pub fn notify_all(&self, catalog: &TranslationCatalog) {
        let inner = self.inner.read();
        for (_id, callback) in &inner.subscribers {
            callback(catalog);
        }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribe_and_notify() {
        let registry = SubscriberRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let _handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all(&TranslationCatalog::empty());
        registry.notify_all(&TranslationCatalog::empty());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_on_drop() {
        let registry = SubscriberRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        let _other = registry.subscribe(|_| {});
        assert_eq!(registry.subscriber_count(), 2);

        drop(handle);
        assert_eq!(registry.subscriber_count(), 1);

        registry.notify_all(&TranslationCatalog::empty());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handle_outlives_registry() {
        let registry = SubscriberRegistry::new();
        let handle = registry.subscribe(|_| {});
        drop(registry);
        drop(handle);
    }

    #[test]
    fn test_callback_sees_catalog() {
        let registry = SubscriberRegistry::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = Arc::clone(&seen);
        let _handle = registry.subscribe(move |catalog| {
            seen_clone.store(catalog.stats().locales, Ordering::SeqCst);
        });

        let catalog = TranslationCatalog::new([("en".to_string(), Default::default())]);
        registry.notify_all(&catalog);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
