//! Script a flaky key-value store and drive it from async code.
//!
//! Run with: cargo run -p controllables-runtime --example flaky_store

use std::time::Duration;

use controllables_runtime::prelude::*;

#[derive(Debug, Clone, thiserror::Error)]
#[error("store unavailable, retry after {retry_after_ms}ms")]
struct Unavailable {
    retry_after_ms: u64,
}

/// Stand-in for a remote store whose `get` is scripted by the caller.
struct FlakyStore {
    get: ControlledMethod<(String,), Option<String>, Throws1<Unavailable>>,
}

impl FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Unavailable> {
        self.get.exit_async((key.to_string(),)).await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("controllables_kernel=debug")
        .init();

    let store = FlakyStore {
        get: ControlledMethod::named("FlakyStore::get"),
    };
    store
        .get
        .controllable()
        .add_checked_fault1(Unavailable { retry_after_ms: 20 })?
        .add_checked_fault1(Unavailable { retry_after_ms: 40 })?
        .add_delayed_normal_exit(Some("v1".to_string()), Duration::from_millis(50))?;

    let value = loop {
        match store.get("config").await {
            Ok(value) => break value,
            Err(unavailable) => {
                println!("{unavailable}");
                tokio::time::sleep(Duration::from_millis(unavailable.retry_after_ms)).await;
            }
        }
    };
    println!("got {value:?}");

    for summary in store.get.controllable().history()?.summaries() {
        println!("{}", serde_json::to_string(&summary)?);
    }
    Ok(())
}
