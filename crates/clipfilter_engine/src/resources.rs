use bytes::Bytes;
use clipfilter_core::ThumbnailHandle;
use clipfilter_logging::clip_trace;

struct LiveResource {
    handle: ThumbnailHandle,
    bytes: Bytes,
}

/// Owns the single locally-addressable thumbnail resource.
///
/// At most one resource is live at a time. Handle ids are never reused, so
/// a released handle can never again resolve to bytes.
#[derive(Default)]
pub struct ResourceLifecycleManager {
    next_id: u64,
    live: Option<LiveResource>,
}

impl ResourceLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `bytes` in a fresh handle. A resource that is still live is
    /// released first.
    pub fn acquire(&mut self, bytes: Bytes) -> ThumbnailHandle {
        self.release_current();
        self.next_id += 1;
        let handle = ThumbnailHandle::new(self.next_id);
        clip_trace!("acquired {} ({} bytes)", handle.url, bytes.len());
        self.live = Some(LiveResource {
            handle: handle.clone(),
            bytes,
        });
        handle
    }

    /// Invalidates `handle`. Releasing an unknown or already released
    /// handle is a no-op; returns whether anything was released.
    pub fn release(&mut self, handle: &ThumbnailHandle) -> bool {
        match &self.live {
            Some(live) if live.handle.id == handle.id => {
                self.release_current();
                true
            }
            _ => false,
        }
    }

    /// Releases the current resource and acquires `bytes` in its place.
    pub fn replace(&mut self, bytes: Bytes) -> ThumbnailHandle {
        self.release_current();
        self.acquire(bytes)
    }

    pub fn release_current(&mut self) -> Option<ThumbnailHandle> {
        let live = self.live.take()?;
        clip_trace!("released {}", live.handle.url);
        Some(live.handle)
    }

    pub fn current(&self) -> Option<&ThumbnailHandle> {
        self.live.as_ref().map(|live| &live.handle)
    }

    pub fn bytes(&self, handle: &ThumbnailHandle) -> Option<&Bytes> {
        self.live
            .as_ref()
            .filter(|live| live.handle.id == handle.id)
            .map(|live| &live.bytes)
    }

    pub fn is_live(&self, handle: &ThumbnailHandle) -> bool {
        self.bytes(handle).is_some()
    }

    pub fn live_count(&self) -> usize {
        usize::from(self.live.is_some())
    }
}
