use tokio::sync::Mutex as AsyncMutex;

/// Serializes tests that touch `SUMMARY_*` environment variables.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

pub fn clear_summary_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("SUMMARY_") {
            std::env::remove_var(key);
        }
    }
}
