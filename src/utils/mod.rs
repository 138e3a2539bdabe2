//! Output helpers shared by the CLI commands
//!
//! - [`progress`] - spinners for long-running hub operations
//! - [`safe_file_component`] / [`output_dir_name`] - naming of output folders

pub mod progress;

pub use progress::ProgressBar;

/// Make `name` usable as a single path component.
///
/// ASCII letters, digits, `-` and `_` are kept; every other character becomes
/// `_`, so distinct group names of equal length stay distinguishable.
pub fn safe_file_component(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Name of the folder receiving filtered output: `filtered_<timestamp>_<group>`.
pub fn output_dir_name(timestamp: &chrono::DateTime<chrono::Local>, group: &str) -> String {
    format!("filtered_{}_{}", timestamp.format("%Y%m%d_%H%M%S"), safe_file_component(group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_safe_file_component() {
        assert_eq!(safe_file_component("Platform-Team_2"), "Platform-Team_2");
        assert_eq!(safe_file_component("Mobile / iOS"), "Mobile___iOS");
        assert_eq!(safe_file_component("../etc"), "___etc");
        assert_eq!(safe_file_component("Über"), "_ber");
    }

    #[test]
    fn test_output_dir_name() {
        let timestamp = chrono::Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(output_dir_name(&timestamp, "Mobile Apps"), "filtered_20240309_140507_Mobile_Apps");
    }
}
