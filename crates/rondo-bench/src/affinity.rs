//! CPU affinity: pin worker threads to specific cores for a trial.
//!
//! Logical participant id maps to core id directly (participant 0 on core
//! 0, and so on). On hosts with hyperthreading this can place two
//! participants on sibling threads of one physical core, which distorts
//! latency measurements; that is a known caveat of the direct mapping and
//! is deliberately not corrected here.

use rondo_error::Result;

/// Pin a spawned worker thread to `core`.
///
/// # Errors
///
/// [`rondo_error::RondoError::Affinity`] when the kernel rejects the mask
/// (e.g. the core does not exist).
#[cfg(target_os = "linux")]
pub fn pin_thread<T>(handle: &std::thread::JoinHandle<T>, core: usize) -> Result<()> {
    use std::os::unix::thread::JoinHandleExt;

    pin_pthread(handle.as_pthread_t(), core)
}

/// Pin the calling thread to `core`.
///
/// # Errors
///
/// [`rondo_error::RondoError::Affinity`] when the kernel rejects the mask.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(core: usize) -> Result<()> {
    pin_pthread(unsafe { libc::pthread_self() }, core)
}

#[cfg(target_os = "linux")]
fn pin_pthread(thread: libc::pthread_t, core: usize) -> Result<()> {
    let mut cpuset: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    unsafe {
        libc::CPU_ZERO(&mut cpuset);
        libc::CPU_SET(core, &mut cpuset);
    }

    let rc = unsafe {
        libc::pthread_setaffinity_np(thread, std::mem::size_of::<libc::cpu_set_t>(), &cpuset)
    };
    if rc != 0 {
        return Err(rondo_error::RondoError::Affinity { core, errno: rc });
    }
    tracing::trace!(target: "rondo.affinity", core, "thread pinned");
    Ok(())
}

/// Pinning is only implemented for Linux; elsewhere this is a logged no-op
/// so the harness stays runnable (measurements are unpinned).
#[cfg(not(target_os = "linux"))]
pub fn pin_thread<T>(_handle: &std::thread::JoinHandle<T>, core: usize) -> Result<()> {
    tracing::debug!(target: "rondo.affinity", core, "thread pinning unsupported on this platform");
    Ok(())
}

/// See [`pin_thread`].
#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(core: usize) -> Result<()> {
    tracing::debug!(target: "rondo.affinity", core, "thread pinning unsupported on this platform");
    Ok(())
}
