//! Status code classification.
//!
//! # States
//! - InputRequired (1x): meta is a prompt, 11 asks for sensitive input
//! - Success (2x): meta is a media type, a body follows
//! - Redirect (3x): meta is the target, 31 is permanent
//! - Error: 4x temporary, 5x permanent, 6x client certificate, anything else unknown

use std::fmt;

/// Which of the failure groups an error status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Temporary,
    Permanent,
    CertificateRequired,
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Temporary => "temporary failure",
            FailureKind::Permanent => "permanent failure",
            FailureKind::CertificateRequired => "client certificate required",
            FailureKind::Unknown => "unknown status",
        };
        f.write_str(label)
    }
}

/// Coarse category of a two-digit status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    InputRequired { sensitive: bool },
    Success,
    Redirect { permanent: bool },
    Error(FailureKind),
}

impl StatusClass {
    /// Classify a raw status code.
    pub fn from_code(code: u8) -> Self {
        match code {
            10..=19 => StatusClass::InputRequired { sensitive: code == 11 },
            20..=29 => StatusClass::Success,
            30..=39 => StatusClass::Redirect { permanent: code == 31 },
            40..=49 => StatusClass::Error(FailureKind::Temporary),
            50..=59 => StatusClass::Error(FailureKind::Permanent),
            60..=69 => StatusClass::Error(FailureKind::CertificateRequired),
            _ => StatusClass::Error(FailureKind::Unknown),
        }
    }

    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            StatusClass::InputRequired { .. } => "input",
            StatusClass::Success => "success",
            StatusClass::Redirect { .. } => "redirect",
            StatusClass::Error(_) => "error",
        }
    }
}
