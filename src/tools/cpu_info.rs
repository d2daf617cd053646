use sysinfo::System;

/// 可用的邏輯核心數，至少為 1
#[must_use]
pub fn logical_core_count() -> usize {
    let mut system = System::new();
    system.refresh_cpu_all();

    match system.cpus().len() {
        0 => std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
        count => count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_core_count_positive() {
        assert!(logical_core_count() >= 1);
    }
}
