use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn setup_shutdown_signal() -> Result<Arc<AtomicBool>> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\n收到中斷信號，正在安全關閉...");
    })
    .context("無法設定 Ctrl-C 處理器")?;

    Ok(shutdown_signal)
}

#[must_use]
pub fn is_shutdown_requested(shutdown_signal: &AtomicBool) -> bool {
    shutdown_signal.load(Ordering::SeqCst)
}

/// 一次操作被中斷後清除旗標，讓選單可以繼續使用
pub fn reset_shutdown_signal(shutdown_signal: &AtomicBool) {
    shutdown_signal.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_flag() {
        let signal = AtomicBool::new(true);
        assert!(is_shutdown_requested(&signal));
        reset_shutdown_signal(&signal);
        assert!(!is_shutdown_requested(&signal));
    }
}
