use std::fmt;

/// Camera session state machine.
///
/// State transitions:
/// ```text
/// finalized → initialized → idle → doing-scan → scan-done → still-capturing
///     ↑            │          ↑ ↑      │            │              │
///     │            │          │ │      ↓            ↓              │
///     │            │          │ └── cancelling-scan ←┘              │
///     │            │          └───────────────────────────────────┘
///     │            │          idle ⇄ recording
///     └────────────┴──── pause / force stop (deferred while capturing or recording)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Device closed. Terminal state; the only state `start()` accepts.
    Finalized,
    /// Device open and surface readiness pending.
    Initialized,
    /// Preview running, ready to scan.
    Idle,
    /// Autofocus + AE/AWB lock in flight.
    DoingScan,
    /// Scan abort in flight.
    CancellingScan,
    /// Scan finished; AE/AWB locked when `success`.
    ScanDone { success: bool },
    /// Still capture in flight.
    StillCapturing,
    /// Video recording running or winding down.
    Recording,
}

impl SessionState {
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether the preview is running (idle or anywhere past it).
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Finalized | Self::Initialized)
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self, Self::DoingScan | Self::CancellingScan)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finalized => write!(f, "finalized"),
            Self::Initialized => write!(f, "initialized"),
            Self::Idle => write!(f, "idle"),
            Self::DoingScan => write!(f, "doing-scan"),
            Self::CancellingScan => write!(f, "cancelling-scan"),
            Self::ScanDone { success } => write!(f, "scan-done({})", success),
            Self::StillCapturing => write!(f, "still-capturing"),
            Self::Recording => write!(f, "recording"),
        }
    }
}
