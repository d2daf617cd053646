/// 將位元組數轉為二進位單位字串（例如 "333.37 MiB"）
#[must_use]
pub fn format_file_size(size_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    if size_bytes < 1024 {
        return format!("{size_bytes} B");
    }

    let mut size = size_bytes as f64;
    let mut unit_index = 0;
    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{size:.2} {}", UNITS[unit_index])
}

/// 人類可讀的時長（例如 "42.0s"、"2m 30s"、"1h 15m 30s"）
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        return format!("{seconds:.1}s");
    }

    let minutes = (seconds / 60.0) as u64;
    let remaining_seconds = seconds % 60.0;

    if minutes < 60 {
        return format!("{minutes}m {remaining_seconds:.0}s");
    }

    let hours = minutes / 60;
    let remaining_minutes = minutes % 60;

    match (remaining_minutes, remaining_seconds < 1.0) {
        (0, true) => format!("{hours}h"),
        (_, true) => format!("{hours}h {remaining_minutes}m"),
        _ => format!("{hours}h {remaining_minutes}m {remaining_seconds:.0}s"),
    }
}

/// HH:MM:SS
#[must_use]
pub fn format_hms(total_seconds: u64) -> String {
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// 以最大公因數化簡長寬比（例如 1920x1080 -> "16:9"）
#[must_use]
pub fn aspect_ratio(width: u32, height: u32) -> String {
    if width == 0 || height == 0 {
        return "Unknown".to_string();
    }

    let divisor = gcd(width, height);
    format!("{}:{}", width / divisor, height / divisor)
}

const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
