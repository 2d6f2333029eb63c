use std::sync::mpsc;
use std::time::Duration;

pub(super) const ACTION_RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);

/// Runs `work` on a background thread and hands its result back on the GTK main loop.
/// `on_result` receives `None` if the worker died without producing a value.
pub(super) fn spawn_worker_action<T, W, H>(name: &str, work: W, mut on_result: H)
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
    H: FnMut(Option<T>) + 'static,
{
    let (tx, rx) = mpsc::channel::<T>();
    let spawned = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let result = work();
            let _ = tx.send(result);
        });
    if let Err(err) = spawned {
        tracing::error!(%err, worker = name, "failed to spawn worker thread");
        on_result(None);
        return;
    }

    gtk4::glib::timeout_add_local(ACTION_RESULT_POLL_INTERVAL, move || match rx.try_recv() {
        Ok(result) => {
            on_result(Some(result));
            gtk4::glib::ControlFlow::Break
        }
        Err(mpsc::TryRecvError::Empty) => gtk4::glib::ControlFlow::Continue,
        Err(mpsc::TryRecvError::Disconnected) => {
            tracing::error!("worker thread exited without a result");
            on_result(None);
            gtk4::glib::ControlFlow::Break
        }
    });
}
