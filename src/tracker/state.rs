//! Tracker protocol state
//!
//! [`TrackerState`] is created once at startup and passed by reference into
//! every handler. Other subsystems that run outside the control loop read the
//! last published [`TrackerSnapshot`] instead of touching the state directly.

use super::mode::{Mode, ModeReason};
use super::ModeControl;
use core::cell::Cell;
use critical_section::Mutex;

/// Binding of this tracker to one remote vehicle
///
/// Replaced as a whole value, so a reader never sees a lock without a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetLock {
    target_sysid: Option<u8>,
    locked: bool,
}

impl TargetLock {
    /// No vehicle selected
    pub const UNLOCKED: Self = Self {
        target_sysid: None,
        locked: false,
    };

    /// Lock committed to `sysid`
    pub const fn locked_to(sysid: u8) -> Self {
        Self {
            target_sysid: Some(sysid),
            locked: true,
        }
    }

    /// Whether the lock has been committed
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// System ID of the tracked vehicle
    pub fn target_sysid(&self) -> Option<u8> {
        self.target_sysid
    }
}

/// Home upload handshake state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadSession {
    /// No upload in progress
    #[default]
    Idle,
    /// MISSION_WRITE_PARTIAL_LIST for index 0 received, waiting for item 0
    AwaitingHome,
}

impl UploadSession {
    /// Whether a home item would be accepted
    pub fn is_awaiting_home(&self) -> bool {
        matches!(self, UploadSession::AwaitingHome)
    }
}

/// State owned by the protocol layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerState {
    mode: Mode,
    target_lock: TargetLock,
    upload: UploadSession,
    need_altitude_calibration: bool,
}

impl TrackerState {
    /// Create state for a freshly started tracker (mode INITIALISING, unlocked)
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Request a mode change through the mode collaborator
    ///
    /// The current mode only changes if the collaborator accepts. Requesting
    /// the current mode succeeds without calling the collaborator.
    pub fn set_mode<M: ModeControl + ?Sized>(
        &mut self,
        modes: &mut M,
        mode: Mode,
        reason: ModeReason,
    ) -> bool {
        if self.mode == mode {
            return true;
        }

        if !modes.set_mode(mode, reason) {
            crate::log_warn!(
                "Mode change {} -> {} rejected ({})",
                self.mode.as_str(),
                mode.as_str(),
                reason.as_str()
            );
            return false;
        }

        crate::log_info!(
            "Mode change: {} -> {} ({})",
            self.mode.as_str(),
            mode.as_str(),
            reason.as_str()
        );
        self.mode = mode;
        true
    }

    /// Record a mode change made outside the protocol layer (RC switch, startup)
    pub fn sync_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Current target lock
    pub fn target_lock(&self) -> TargetLock {
        self.target_lock
    }

    /// Commit the lock to `sysid`
    ///
    /// Returns `false` and leaves the lock untouched if already committed.
    pub fn commit_target_lock(&mut self, sysid: u8) -> bool {
        if self.target_lock.is_locked() {
            return false;
        }
        self.target_lock = TargetLock::locked_to(sysid);
        true
    }

    /// Home upload handshake state
    pub fn upload(&self) -> UploadSession {
        self.upload
    }

    /// Enter or leave the home upload handshake
    pub fn set_upload(&mut self, upload: UploadSession) {
        self.upload = upload;
    }

    /// Whether a barometer calibration was requested
    pub fn need_altitude_calibration(&self) -> bool {
        self.need_altitude_calibration
    }

    /// Flag or clear a pending barometer calibration
    pub fn set_need_altitude_calibration(&mut self, need: bool) {
        self.need_altitude_calibration = need;
    }

    /// Copy of the fields visible to other subsystems
    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            mode: self.mode,
            target_lock: self.target_lock,
            need_altitude_calibration: self.need_altitude_calibration,
        }
    }

    /// Publish the current snapshot for readers outside the control loop
    pub fn publish(&self) {
        let snapshot = self.snapshot();
        critical_section::with(|cs| PUBLISHED.borrow(cs).set(snapshot));
    }
}

/// Read-only view of tracker state for other subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackerSnapshot {
    pub mode: Mode,
    pub target_lock: TargetLock,
    pub need_altitude_calibration: bool,
}

impl TrackerSnapshot {
    const INITIAL: Self = Self {
        mode: Mode::Initialising,
        target_lock: TargetLock::UNLOCKED,
        need_altitude_calibration: false,
    };
}

static PUBLISHED: Mutex<Cell<TrackerSnapshot>> = Mutex::new(Cell::new(TrackerSnapshot::INITIAL));

/// Last snapshot published by the control loop
pub fn latest_snapshot() -> TrackerSnapshot {
    critical_section::with(|cs| PUBLISHED.borrow(cs).get())
}
