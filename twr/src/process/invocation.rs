//! Argument shapes accepted by the process runner

use crate::sanitize::sanitize_arguments;

/// What to pass to the task executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Explicit argument vector, passed to the executable without a shell
    Args(Vec<String>),
    /// Literal command-line suffix, interpreted by the shell after the executable
    /// path. Raw user text must already be sanitized.
    Line(String),
}

impl Invocation {
    pub fn args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Args(args.into_iter().map(Into::into).collect())
    }

    pub fn line(line: impl Into<String>) -> Self {
        Self::Line(line.into())
    }

    /// The command-line suffix as it would be typed at a shell
    pub fn command_line(&self) -> String {
        match self {
            Self::Args(args) => sanitize_arguments(args),
            Self::Line(line) => line.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let inv = Invocation::args(["_get", "rc.report.next.labels"]);
        assert_eq!(inv.command_line(), "\"_get\" \"rc.report.next.labels\"");

        let inv = Invocation::line("add \"buy milk\"");
        assert_eq!(inv.command_line(), "add \"buy milk\"");
    }
}
