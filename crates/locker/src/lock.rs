//! Lock handles returned by a successful acquisition.

use crate::error::BoxError;
use crate::locker::ReleaseFn;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Option applied to a [`Lock`] right after it is acquired.
///
/// Options passed to [`Locker::acquire_with`](crate::Locker::acquire_with)
/// run in the order given, before the handle is returned.
pub type LockOption<K> = Box<dyn FnOnce(&mut Lock<K>) + Send>;

/// Attach a human readable label to the lock.
pub fn with_label<K: 'static>(label: impl Into<String>) -> LockOption<K> {
    let label = label.into();
    Box::new(move |lock: &mut Lock<K>| lock.set_label(label))
}

/// Attach a metadata entry to the lock. Later entries overwrite earlier ones.
pub fn with_metadata<K: 'static>(
    key: impl Into<String>,
    value: impl Into<String>,
) -> LockOption<K> {
    let (key, value) = (key.into(), value.into());
    Box::new(move |lock: &mut Lock<K>| {
        lock.insert_metadata(key, value);
    })
}

/// A successfully acquired lock.
///
/// The handle holds the key and the capability to release it. Calling
/// [`release`](Lock::release) more than once is allowed; what a second
/// release means is up to the release function.
pub struct Lock<K> {
    key: K,
    release: Arc<dyn ReleaseFn<K>>,
    attempts: u32,
    label: Option<String>,
    metadata: BTreeMap<String, String>,
}

impl<K> Lock<K> {
    pub(crate) fn new(key: K, release: Arc<dyn ReleaseFn<K>>, attempts: u32) -> Self {
        Self {
            key,
            release,
            attempts,
            label: None,
            metadata: BTreeMap::new(),
        }
    }

    /// The key this lock was acquired for.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// How many acquire attempts it took to obtain the lock.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Label set by [`with_label`], if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Replace the label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Metadata attached through lock options.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Insert a metadata entry, returning the previous value for `key`.
    pub fn insert_metadata(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.metadata.insert(key.into(), value.into())
    }

    /// Release the lock.
    ///
    /// Calls the release function with this lock's key and returns its
    /// result unchanged. No retry is applied.
    pub async fn release(&self, ctx: &CancellationToken) -> Result<(), BoxError> {
        self.release.release(ctx, &self.key).await
    }
}

impl<K: fmt::Debug> fmt::Debug for Lock<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock")
            .field("key", &self.key)
            .field("attempts", &self.attempts)
            .field("label", &self.label)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_release(released: Arc<Mutex<Vec<String>>>) -> Arc<dyn ReleaseFn<String>> {
        Arc::new(move |_ctx: CancellationToken, key: String| {
            let released = Arc::clone(&released);
            async move {
                released.lock().unwrap().push(key);
                Ok::<(), BoxError>(())
            }
        })
    }

    #[test]
    fn test_options_apply_in_order() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let mut lock = Lock::new("k".to_string(), recording_release(released), 1);

        let options: Vec<LockOption<String>> = vec![
            with_label("first"),
            with_metadata("owner", "a"),
            with_label("second"),
            with_metadata("owner", "b"),
        ];
        for option in options {
            option(&mut lock);
        }

        assert_eq!(lock.label(), Some("second"));
        assert_eq!(lock.metadata().get("owner").map(String::as_str), Some("b"));
    }

    #[tokio::test]
    async fn test_release_passes_key_and_may_repeat() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let lock = Lock::new(
            "orders/1".to_string(),
            recording_release(Arc::clone(&released)),
            1,
        );
        let ctx = CancellationToken::new();

        lock.release(&ctx).await.unwrap();
        lock.release(&ctx).await.unwrap();

        assert_eq!(*released.lock().unwrap(), vec!["orders/1", "orders/1"]);
    }

    #[test]
    fn test_debug_shows_key() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let lock = Lock::new("orders/1".to_string(), recording_release(released), 3);
        let rendered = format!("{:?}", lock);
        assert!(rendered.contains("orders/1"));
        assert!(rendered.contains("attempts: 3"));
    }
}
