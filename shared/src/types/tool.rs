// =============================================================================
// SHARED/SRC/TYPES/TOOL.RS - External Tool Exit Classification
// =============================================================================

use std::fmt;
use std::process::ExitStatus;

/// How an external tool process ended
///
/// Every exit status maps onto exactly one variant. A process with no exit
/// code (killed by a signal on Unix) falls into `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolExit {
    Success,
    Failed(i32),
    Terminated,
}

impl ToolExit {
    /// Classify a raw exit code as reported by the operating system
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => ToolExit::Success,
            Some(code) => ToolExit::Failed(code),
            None => ToolExit::Terminated,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, ToolExit::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ToolExit::Success => Some(0),
            ToolExit::Failed(code) => Some(*code),
            ToolExit::Terminated => None,
        }
    }
}

impl From<ExitStatus> for ToolExit {
    fn from(status: ExitStatus) -> Self {
        ToolExit::from_code(status.code())
    }
}

impl fmt::Display for ToolExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolExit::Success => write!(f, "exited successfully"),
            ToolExit::Failed(code) => write!(f, "exited with status {}", code),
            ToolExit::Terminated => write!(f, "was terminated by a signal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_exit_codes() {
        assert_eq!(ToolExit::from_code(Some(0)), ToolExit::Success);
        assert_eq!(ToolExit::from_code(Some(101)), ToolExit::Failed(101));
        assert_eq!(ToolExit::from_code(None), ToolExit::Terminated);
        assert!(ToolExit::Success.success());
        assert!(!ToolExit::Failed(1).success());
        assert_eq!(ToolExit::Terminated.code(), None);
    }

    #[test]
    fn display_names_the_outcome() {
        assert_eq!(ToolExit::Failed(2).to_string(), "exited with status 2");
        assert_eq!(ToolExit::Terminated.to_string(), "was terminated by a signal");
    }
}
