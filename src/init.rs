use env_logger::Env;

/// 初始化日誌系統
///
/// 預設層級為 `info`，可透過 `RUST_LOG` 覆寫
pub fn init() {
    // 測試中可能重複初始化，忽略錯誤
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();
}
