//! Device-wide lock acquisition and critical sections.
//!
//! A manager obtains its device's runtime-wide lock exactly once, together
//! with the device context, and keeps both in a [`DeviceBinding`]. The context
//! is only reachable through [`DeviceBinding::locked`], so every device call
//! happens inside the critical section.

use std::sync::Arc;

use restex_core::Result;
use tracing::trace;

use crate::device::{same_context, DeviceContext, DeviceLock};

/// RAII critical section on a [`DeviceLock`]. Leaves the lock on drop.
pub struct DeviceLockGuard<'a> {
    lock: &'a dyn DeviceLock,
}

impl<'a> DeviceLockGuard<'a> {
    pub fn enter(lock: &'a dyn DeviceLock) -> Self {
        lock.enter();
        trace!("device lock entered");
        Self { lock }
    }
}

impl Drop for DeviceLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.leave();
        trace!("device lock left");
    }
}

/// A device context together with the lock it handed out.
pub struct DeviceBinding {
    context: Arc<dyn DeviceContext>,
    lock: Arc<dyn DeviceLock>,
}

impl DeviceBinding {
    /// Take ownership of `context` and acquire its device lock.
    ///
    /// Errors from the host are forwarded as-is and nothing is retained.
    pub fn acquire(context: Arc<dyn DeviceContext>) -> Result<Self> {
        let lock = context.device_lock()?;
        Ok(Self { context, lock })
    }

    /// Run `f` against the context inside the device critical section.
    pub fn locked<R>(&self, f: impl FnOnce(&dyn DeviceContext) -> R) -> R {
        let _guard = DeviceLockGuard::enter(self.lock.as_ref());
        f(self.context.as_ref())
    }

    pub fn holds(&self, context: &Arc<dyn DeviceContext>) -> bool {
        same_context(&self.context, context)
    }

    /// Release the context inside the critical section and hand back the
    /// lock, which the caller drops last.
    pub fn release(self) -> Arc<dyn DeviceLock> {
        let DeviceBinding { context, lock } = self;
        {
            let _guard = DeviceLockGuard::enter(lock.as_ref());
            drop(context);
        }
        lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::{SoftwareDevice, SoftwareLock};

    #[test]
    fn guard_balances_enter_and_leave() {
        let lock = SoftwareLock::new();
        {
            let _guard = DeviceLockGuard::enter(lock.as_ref());
            assert!(lock.is_held());
        }
        assert!(!lock.is_held());
        assert_eq!(lock.entries(), 1);
    }

    #[test]
    fn guard_leaves_on_early_return() {
        fn fails(lock: &dyn DeviceLock) -> Result<()> {
            let _guard = DeviceLockGuard::enter(lock);
            Err(restex_core::Error::Fail)
        }
        let lock = SoftwareLock::new();
        assert!(fails(lock.as_ref()).is_err());
        assert!(!lock.is_held());
    }

    #[test]
    fn binding_runs_device_calls_under_lock() {
        let device = SoftwareDevice::new();
        let lock = device.lock();
        let binding = DeviceBinding::acquire(device.clone()).unwrap();
        let held = binding.locked(|_| lock.is_held());
        assert!(held);
        assert!(!lock.is_held());
        let other: Arc<dyn DeviceContext> = SoftwareDevice::new();
        assert!(!binding.holds(&other));
        let same: Arc<dyn DeviceContext> = device;
        assert!(binding.holds(&same));
    }
}
