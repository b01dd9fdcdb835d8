use chrono::{DateTime, Local};

fn build_time(format: &str) -> String {
    let build_timestamp: i64 = env!("BUILD_TIME").parse().unwrap_or(0);
    let build_datetime: DateTime<Local> = DateTime::from_timestamp(build_timestamp, 0)
        .map(|utc| utc.with_timezone(&Local))
        .unwrap_or_else(Local::now);
    build_datetime.format(format).to_string()
}

pub fn get_version_info() -> &'static str {
    Box::leak(
        format!(
            "voicecraft {}\n\
         Build Time: {}\n\
         Git Commit: {}\n\
         Git Branch: {}\n\
         Git Status: {}",
            env!("CARGO_PKG_VERSION"),
            build_time("%Y-%m-%d %H:%M:%S %Z"),
            env!("GIT_COMMIT_HASH"),
            env!("GIT_BRANCH"),
            env!("GIT_DIRTY"),
        )
        .into_boxed_str(),
    )
}

/// `User-Agent` sent to the synthesis provider.
pub fn get_useragent() -> String {
    format!(
        "voicecraft/{} (built {})",
        env!("CARGO_PKG_VERSION"),
        build_time("%Y-%m-%d")
    )
}
