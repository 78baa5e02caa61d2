//! Attribution of statements to the code that issued them.
//!
//! Public engine operations are `#[track_caller]`, so a statement can be
//! attributed to the `file:line` of the application code without any
//! stack inspection. An explicit tag set through
//! [`ExecOptions::caller`](crate::ExecOptions::caller) takes precedence.

use std::fmt;
use std::panic::Location;

/// Who issued a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// Explicit name chosen by the application
    Tag(String),
    /// Source location captured through `#[track_caller]`
    Location { file: &'static str, line: u32 },
}

impl Caller {
    /// The location of the nearest non-`#[track_caller]` frame.
    #[track_caller]
    pub fn here() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(location: &'static Location<'static>) -> Self {
        Caller::Location {
            file: location.file(),
            line: location.line(),
        }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Caller::Tag(name.into())
    }

    /// Does a quiet-set entry name this caller?
    ///
    /// Tags match exactly. Locations match on `file:line`, on the whole
    /// file path, or on a trailing path suffix such as `jobs/sync.rs`.
    pub fn matches(&self, entry: &str) -> bool {
        match self {
            Caller::Tag(tag) => tag == entry,
            Caller::Location { file, line } => {
                match entry.rsplit_once(':') {
                    Some((path, entry_line)) if entry_line.parse::<u32>().is_ok() => {
                        entry_line.parse::<u32>() == Ok(*line) && path_matches(file, path)
                    }
                    _ => path_matches(file, entry),
                }
            }
        }
    }

    /// Is this caller listed in `quiet`?
    pub fn is_quiet(&self, quiet: &[String]) -> bool {
        quiet.iter().any(|entry| self.matches(entry))
    }
}

fn path_matches(file: &str, entry: &str) -> bool {
    if entry.is_empty() {
        return false;
    }
    file == entry
        || file
            .strip_suffix(entry)
            .is_some_and(|head| head.ends_with('/') || head.ends_with('\\'))
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Tag(tag) => f.write_str(tag),
            Caller::Location { file, line } => write!(f, "{}:{}", file, line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_here_points_at_this_file() {
        let caller = Caller::here();
        let Caller::Location { file, line } = caller else {
            panic!("expected a location");
        };
        assert_eq!(file, file!());
        assert!(line > 0);
    }

    #[test]
    fn test_tag_matches_exactly() {
        let caller = Caller::tag("nightly_sync");
        assert!(caller.matches("nightly_sync"));
        assert!(!caller.matches("nightly"));
        assert_eq!(caller.to_string(), "nightly_sync");
    }

    #[test]
    fn test_location_matching() {
        let caller = Caller::Location {
            file: "src/jobs/sync.rs",
            line: 42,
        };
        assert!(caller.matches("src/jobs/sync.rs"));
        assert!(caller.matches("jobs/sync.rs"));
        assert!(caller.matches("src/jobs/sync.rs:42"));
        assert!(caller.matches("sync.rs:42"));
        assert!(!caller.matches("src/jobs/sync.rs:43"));
        assert!(!caller.matches("ync.rs"));
        assert!(!caller.matches(""));
        assert_eq!(caller.to_string(), "src/jobs/sync.rs:42");
    }

    #[test]
    fn test_is_quiet() {
        let quiet = vec!["cron".to_string(), "src/report.rs".to_string()];
        assert!(Caller::tag("cron").is_quiet(&quiet));
        assert!(
            Caller::Location {
                file: "src/report.rs",
                line: 1
            }
            .is_quiet(&quiet)
        );
        assert!(!Caller::tag("web").is_quiet(&quiet));
        assert!(!Caller::tag("web").is_quiet(&[]));
    }
}
