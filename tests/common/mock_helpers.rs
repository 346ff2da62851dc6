//! Mock construction helpers

use crossbeam_channel::{bounded, Receiver, Sender};

#[cfg(feature = "mock-backend")]
use flowstudio_rs::client::{FlowService, ScriptedFlowApi, ServiceHandle};
#[cfg(feature = "mock-backend")]
use flowstudio_rs::client::mock_api::ScriptedBackendHandle;

/// Create test channels with default size
pub fn create_test_channels<T, U>() -> (Sender<T>, Receiver<T>, Sender<U>, Receiver<U>) {
    let (tx1, rx1) = bounded(16);
    let (tx2, rx2) = bounded(16);
    (tx1, rx1, tx2, rx2)
}

/// Spawn a service worker over a scripted backend
///
/// Returns the UI-side handle, the scripting controls, and the worker
/// thread. Call `handle.shutdown()` and join the thread when done.
#[cfg(feature = "mock-backend")]
pub fn start_scripted_service(
    api: ScriptedFlowApi,
) -> (
    ServiceHandle,
    ScriptedBackendHandle,
    std::thread::JoinHandle<()>,
) {
    let controls = api.controls();
    let (service, handle) = FlowService::new(Box::new(api));
    let worker = std::thread::spawn(move || service.run());
    (handle, controls, worker)
}
