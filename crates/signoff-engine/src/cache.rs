/// Outbound cache-invalidation hook, called after a successful sign with the
/// destination's new timestamp. Failures are logged and swallowed by the
/// caller (see [`crate::updater::Updater`]) — never propagated as a pipeline
/// error.
pub trait CacheInvalidator: Send + Sync {
    /// Invalidate `paths` under `distribution_id`.
    ///
    /// # Errors
    /// Any string describing the failure; the caller only logs it.
    fn invalidate(&self, distribution_id: &str, paths: &[String]) -> Result<(), String>;
}

/// A [`CacheInvalidator`] that does nothing and always succeeds, for
/// resources with no `distribution_id` configured and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInvalidator;

impl CacheInvalidator for NoopInvalidator {
    fn invalidate(&self, _distribution_id: &str, _paths: &[String]) -> Result<(), String> {
        Ok(())
    }
}

/// Cache-invalidation settings resolved for one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSettings {
    /// CDN distribution id to invalidate, if configured.
    pub distribution_id: Option<String>,
    /// Path patterns to invalidate.
    pub invalidation_paths: Vec<String>,
}

impl CacheSettings {
    /// Run the hook if a distribution is configured, logging and swallowing
    /// any failure.
    pub fn invalidate_with(&self, invalidator: &dyn CacheInvalidator) {
        let Some(distribution_id) = &self.distribution_id else {
            return;
        };
        if let Err(err) = invalidator.invalidate(distribution_id, &self.invalidation_paths) {
            tracing::warn!(distribution_id, error = %err, "cache invalidation failed");
        }
    }
}
