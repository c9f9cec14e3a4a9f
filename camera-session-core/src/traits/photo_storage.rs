/// Completion of a store request: success flag and a locator for the
/// stored photo.
pub type StoreCompletion = Box<dyn FnOnce(bool, Option<String>) + Send + 'static>;

/// Persists captured photos.
///
/// `store_photo` must return immediately; the completion may fire from any
/// thread.
pub trait PhotoStorage: Send + Sync {
    fn store_photo(&self, data: Vec<u8>, on_stored: StoreCompletion);
}
