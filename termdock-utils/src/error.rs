//! Error types for termdock
//!
//! Provides a unified error type used across all termdock crates.

use std::path::PathBuf;

/// Main error type for termdock operations
#[derive(Debug, thiserror::Error)]
pub enum TermdockError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Launch Errors ===

    #[error("No terminal executable configured")]
    LaunchPathEmpty,

    #[error("Terminal executable not found: {0}")]
    LaunchMissing(PathBuf),

    #[error("Terminal executable access denied: {0}")]
    LaunchDenied(PathBuf),

    #[error("Failed to spawn process: {0}")]
    ProcessSpawn(String),

    // === Window Discovery Errors ===

    #[error("No window of class {class:?} found for pid {pid} within {millis}ms")]
    DiscoveryTimeout { class: String, pid: u32, millis: u64 },

    #[error("Window discovery cancelled")]
    DiscoveryCancelled,

    #[error("Window operation failed: {0}")]
    WindowOp(String),

    // === Input Hook Errors ===

    #[error("Input hook installation failed: {0}")]
    HookInstall(String),

    // === Layout Errors ===

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Invalid persist string: {0}")]
    PersistString(String),

    // === Session Errors ===

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session store error: {0}")]
    Store(String),

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TermdockError {
    /// Create a window operation error
    pub fn window(msg: impl Into<String>) -> Self {
        Self::WindowOp(msg.into())
    }

    /// Create a hook installation error
    pub fn hook(msg: impl Into<String>) -> Self {
        Self::HookInstall(msg.into())
    }

    /// Create a layout error
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    /// Create a session store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Launch failures abort panel creation and are shown to the user
    /// as a blocking notification.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::LaunchPathEmpty
                | Self::LaunchMissing(_)
                | Self::LaunchDenied(_)
                | Self::ProcessSpawn(_)
        )
    }

    /// Failures that degrade a feature but leave the workspace usable
    /// (hook arbitration disabled, layout entry dropped).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::HookInstall(_)
                | Self::Layout(_)
                | Self::PersistString(_)
                | Self::DiscoveryTimeout { .. }
                | Self::DiscoveryCancelled
        )
    }
}

/// Result type alias using TermdockError
pub type Result<T> = std::result::Result<T, TermdockError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Display Tests ====================

    #[test]
    fn test_error_display_session_not_found() {
        let err = TermdockError::SessionNotFound("srv1".into());
        assert_eq!(err.to_string(), "Session not found: srv1");
    }

    #[test]
    fn test_error_display_launch_missing() {
        let err = TermdockError::LaunchMissing(PathBuf::from("C:\\tools\\putty.exe"));
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("putty.exe"));
    }

    #[test]
    fn test_error_display_discovery_timeout() {
        let err = TermdockError::DiscoveryTimeout {
            class: "PuTTY".into(),
            pid: 4242,
            millis: 10_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("PuTTY"));
        assert!(msg.contains("4242"));
        assert!(msg.contains("10000ms"));
    }

    #[test]
    fn test_error_display_file_write() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = TermdockError::FileWrite {
            path: PathBuf::from("/tmp/layout.txt"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to write file"));
        assert!(msg.contains("layout.txt"));
    }

    // ==================== Classification Tests ====================

    #[test]
    fn test_launch_errors_are_fatal() {
        assert!(TermdockError::LaunchPathEmpty.is_fatal());
        assert!(TermdockError::LaunchMissing(PathBuf::from("x")).is_fatal());
        assert!(TermdockError::LaunchDenied(PathBuf::from("x")).is_fatal());
        assert!(TermdockError::ProcessSpawn("boom".into()).is_fatal());
    }

    #[test]
    fn test_hook_and_layout_errors_are_recoverable() {
        assert!(TermdockError::hook("SetWindowsHookEx failed").is_recoverable());
        assert!(TermdockError::layout("bad line").is_recoverable());
        assert!(TermdockError::DiscoveryCancelled.is_recoverable());
        assert!(!TermdockError::hook("x").is_fatal());
    }

    #[test]
    fn test_fatal_and_recoverable_are_disjoint() {
        let errors = [
            TermdockError::LaunchPathEmpty,
            TermdockError::HookInstall("x".into()),
            TermdockError::Layout("x".into()),
            TermdockError::SessionNotFound("x".into()),
            TermdockError::Internal("x".into()),
        ];
        for err in errors {
            assert!(
                !(err.is_fatal() && err.is_recoverable()),
                "{:?} is both fatal and recoverable",
                err
            );
        }
    }

    // ==================== From Trait Tests ====================

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: TermdockError = io_err.into();
        assert!(matches!(err, TermdockError::Io(_)));
    }

    // ==================== Helper Function Tests ====================

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(
            TermdockError::window("reparent failed"),
            TermdockError::WindowOp(_)
        ));
        assert!(matches!(
            TermdockError::store("duplicate id"),
            TermdockError::Store(_)
        ));
        assert!(matches!(
            TermdockError::config("bad filter"),
            TermdockError::Config(_)
        ));
        assert!(matches!(
            TermdockError::internal("invariant violated"),
            TermdockError::Internal(_)
        ));
    }

    #[test]
    fn test_result_alias() {
        let ok: Result<u16> = Ok(22);
        assert_eq!(ok.unwrap(), 22);
        let err: Result<u16> = Err(TermdockError::SessionNotFound("gone".into()));
        assert!(err.is_err());
    }
}
