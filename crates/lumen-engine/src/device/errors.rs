use std::sync::{Arc, Mutex, PoisonError};

/// Slot for wgpu errors raised outside an explicit scope.
///
/// The device handler stores the first error since the last [`take`](Self::take);
/// callers take before and after a group of device calls to learn whether the
/// group failed. Without a handler wgpu panics on validation errors.
#[derive(Debug, Clone, Default)]
pub(super) struct ErrorSlot {
    pending: Arc<Mutex<Option<String>>>,
}

impl ErrorSlot {
    pub fn install(device: &wgpu::Device) -> Self {
        let slot = Self::default();
        let pending = Arc::clone(&slot.pending);
        device.on_uncaptured_error(Arc::new(move |err: wgpu::Error| {
            log::error!("wgpu error: {err}");
            store(&pending, err.to_string());
        }));
        slot
    }

    pub fn take(&self) -> Option<String> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    #[cfg(test)]
    fn record(&self, message: &str) {
        store(&self.pending, message.to_owned());
    }
}

fn store(pending: &Mutex<Option<String>>, message: String) {
    let mut pending = pending.lock().unwrap_or_else(PoisonError::into_inner);
    if pending.is_none() {
        *pending = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_error_until_taken() {
        let slot = ErrorSlot::default();
        assert_eq!(slot.take(), None);

        slot.record("first");
        slot.record("second");
        assert_eq!(slot.take().as_deref(), Some("first"));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn clones_share_the_slot() {
        let slot = ErrorSlot::default();
        slot.clone().record("shared");
        assert_eq!(slot.take().as_deref(), Some("shared"));
    }
}
