//! Session management
//!
//! A session is one run of an executable. It owns a directory under the software root holding
//! the run's log file and an `arch` directory for archives, and fixes the epoch which log and
//! archive timestamps are measured from.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal imports
use crate::{host, time};

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// strftime format of the timestamp in session directory names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the archive directory within a session.
const ARCH_DIR_NAME: &str = "arch";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Session {
    /// `<sessions_dir>/<exec_name>_<timestamp>`
    pub session_root: PathBuf,

    /// Directory archives are written into
    pub arch_root: PathBuf,

    /// `<session_root>/<exec_name>.log`
    pub log_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable ({}) is not set", host::SW_ROOT_ENV_VAR)]
    SwRootNotSet,

    #[error("Cannot create the session directory {0:?}: {1}")]
    CannotCreateDir(PathBuf, std::io::Error),

    #[error("A session has already been started in this process")]
    AlreadyStarted,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start the session for this process in `$ODO_SW_ROOT/<sessions_dir>`.
    ///
    /// Only one session may be started per process, as it fixes the epoch.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        SESSION_EPOCH
            .try_init_once(Utc::now)
            .map_err(|_| SessionError::AlreadyStarted)?;
        let epoch = SESSION_EPOCH.get().ok_or(SessionError::AlreadyStarted)?;

        Self::create(&root.join(sessions_dir), exec_name, epoch)
    }

    /// Create the directories of a session started at `epoch`.
    fn create(
        sessions_dir: &Path,
        exec_name: &str,
        epoch: &DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let session_root =
            sessions_dir.join(format!("{}_{}", exec_name, epoch.format(TIMESTAMP_FORMAT)));
        let arch_root = session_root.join(ARCH_DIR_NAME);

        // Creating the archive dir also creates the session root
        fs::create_dir_all(&arch_root)
            .map_err(|e| SessionError::CannotCreateDir(arch_root.clone(), e))?;

        Ok(Session {
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            session_root,
            arch_root,
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// Returns zero if no session has been started, so that archives and logs
/// written outside of a session (in tests for example) are still valid.
pub fn get_elapsed_seconds() -> f64 {
    get_epoch()
        .and_then(|e| time::duration_to_seconds(Utc::now() - *e))
        .unwrap_or(0.0)
}

/// The session's epoch, or `None` if no session has been started.
pub fn get_epoch() -> Option<&'static DateTime<Utc>> {
    SESSION_EPOCH.get()
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_create_session_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let epoch = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();

        let session = Session::create(&dir.path().join("sessions"), "odo_exec", &epoch).unwrap();

        let expected_root = dir.path().join("sessions").join("odo_exec_20210304_050607");
        assert_eq!(session.session_root, expected_root);
        assert_eq!(session.arch_root, expected_root.join("arch"));
        assert_eq!(session.log_file_path, expected_root.join("odo_exec.log"));
        assert!(session.arch_root.is_dir());
    }

    #[test]
    fn test_no_session() {
        // No test starts a session, so there is no epoch
        assert_eq!(get_epoch(), None);
        assert_eq!(get_elapsed_seconds(), 0.0);
    }
}
