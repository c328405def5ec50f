//! Issues collected while checking a configuration.

use std::fmt;

/// Issues found while checking a configuration or a calibration.
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// No errors; warnings allowed.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// No issues of any severity.
    pub fn is_ok_strict(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Configuration OK: no issues found");
        }
        writeln!(
            f,
            "{} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message, context)
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{tag} {:?} ({}): {}", self.code, self.context, self.message)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Logged, analysis continues.
    Warning,
    /// Aborts the run before any image is processed.
    Error,
}

/// Stable issue codes, printed by `check-config`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    // Calibration issues
    /// A pixel dimension is zero, negative or not finite.
    NonPositivePixelSize,

    // Border issues
    /// The border shell thickness is zero, negative or not finite.
    NonPositiveShellThickness,
    /// The shell is thinner than half a pixel, so the border will be empty.
    ShellThinnerThanHalfPixel,
    /// The intensity channel name is empty.
    EmptyChannelName,

    // Size bound issues
    /// A size bound is negative or not finite.
    NegativeAreaBound,
    /// The lower size bound exceeds the upper one.
    InvertedAreaBounds,

    // Foci detection issues
    /// A Gaussian sigma is zero, negative or not finite.
    NonPositiveSigma,
    /// The narrow sigma is not smaller than the wide one.
    SigmaOrder,
    /// Both foci channels name the same image channel.
    SameFociChannels,

    // Relation issues
    /// The distance cutoff is negative or not finite.
    NegativeDistanceCutoff,
    /// No cross-distance would ever be reported.
    ZeroReportedDistances,
}

#[derive(Clone, Debug)]
pub enum IssueContext {
    /// Issue with an image calibration (after any override).
    Calibration,
    /// Issue with the pixel size override.
    PixelSizeOverride,
    /// Issue with a configuration section.
    Section { name: &'static str },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Calibration => write!(f, "calibration"),
            IssueContext::PixelSizeOverride => write!(f, "pixel_size"),
            IssueContext::Section { name } => write!(f, "section '{}'", name),
        }
    }
}
