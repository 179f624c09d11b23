//! Fully qualified command keys (`command [group] [sub]`).
//!
//! Keys are compared segment by segment so that `ping` is a prefix of `ping stats` but never of
//! `pingpong`.
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandKey {
    segments: Vec<String>,
}

impl CommandKey {
    /// Parses a space separated id such as `"parent grp sub"`. Repeated whitespace is ignored.
    pub fn parse(id: &str) -> Self {
        Self {
            segments: id.split_whitespace().map(str::to_owned).collect(),
        }
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Structural prefix test: every segment of `prefix` matches the segment at the same position.
    pub fn starts_with(&self, prefix: &CommandKey) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Returns a key one segment deeper.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_owned());
        Self { segments }
    }

    /// True when `self` extends `parent` by exactly one segment.
    pub fn is_child_of(&self, parent: &CommandKey) -> bool {
        self.depth() == parent.depth() + 1 && self.starts_with(parent)
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(" "))
    }
}

impl From<&str> for CommandKey {
    fn from(id: &str) -> Self {
        Self::parse(id)
    }
}
