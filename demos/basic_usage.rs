//! Basic usage example for shared-handle
//!
//! This example walks through the lifecycle of a shared handle:
//! 1. Creating an occupied handle and an empty one
//! 2. Cloning it into tasks on a multi-threaded runtime
//! 3. Swapping and resetting
//! 4. Watching the value get dropped by the last owner
//!
//! Run with `RUST_LOG=trace` to see control blocks being allocated and freed.

use shared_handle::SharedHandle;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

struct Config {
    name: String,
    hits: AtomicU64,
}

impl Drop for Config {
    fn drop(&mut self) {
        println!("dropping config {}", self.name);
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    env_logger::init();

    let config = SharedHandle::new(Config {
        name: "primary".to_string(),
        hits: AtomicU64::new(0),
    });
    let mut spare: SharedHandle<Config> = SharedHandle::empty();
    println!(
        "config owners: {}, spare occupied: {}",
        SharedHandle::use_count(&config),
        SharedHandle::is_occupied(&spare)
    );

    // Every task gets its own owner
    let done = Arc::new(AtomicU64::new(0));
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let config = config.clone();
        let done = done.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..100 {
                config.hits.fetch_add(1, Ordering::Relaxed);
            }
            done.fetch_add(1, Ordering::Relaxed);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    println!(
        "{} tasks finished, {} hits on {}, owners back to {}",
        done.load(Ordering::Relaxed),
        config.hits.load(Ordering::Relaxed),
        config.name,
        SharedHandle::use_count(&config)
    );

    // Swapping moves ownership without touching the count
    let mut config = config;
    SharedHandle::swap(&mut config, &mut spare);
    println!(
        "after swap: config empty = {}, spare = {} ({} owner)",
        SharedHandle::is_empty(&config),
        spare.name,
        SharedHandle::use_count(&spare)
    );

    SharedHandle::reset_with(
        &mut config,
        Box::new(Config {
            name: "secondary".to_string(),
            hits: AtomicU64::new(0),
        }),
    );
    SharedHandle::reset(&mut spare);
    println!(
        "spare empty = {}, config = {}",
        SharedHandle::is_empty(&spare),
        config.name
    );
}
