//! RT-safe reclamation of dataset buffers
//!
//! A global `basedrop` collector provides deferred deallocation for the
//! large decoded datasets. When the renderer drops its `Shared<T>` on the
//! audio thread (dataset reload, unload), the drop only enqueues a
//! pointer; the actual free happens on a background thread where a slow
//! munmap cannot cause an output underrun.

use basedrop::{Collector, Handle};
use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

/// Global handle for creating Shared<T> allocations
///
/// Initialized once; clones are cheap. The Collector itself lives on the
/// GC thread because it is !Sync.
static GC_HANDLE: OnceLock<Handle> = OnceLock::new();

fn init_gc() -> Handle {
    // Channel to send the handle out of the GC thread
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("dataset-gc".to_string())
        .spawn(move || {
            let mut collector = Collector::new();

            let handle = collector.handle();
            tx.send(handle).expect("Failed to send GC handle");

            log::info!("Dataset GC thread started");

            loop {
                collector.collect();

                // 100ms is fast enough for memory reclamation
                thread::sleep(Duration::from_millis(100));
            }
        })
        .expect("Failed to spawn dataset GC thread");

    rx.recv().expect("Failed to receive GC handle")
}

/// Get a handle for creating Shared<T> allocations
///
/// Call this when wrapping a decoded dataset for the audio thread.
pub fn gc_handle() -> Handle {
    GC_HANDLE.get_or_init(init_gc).clone()
}
