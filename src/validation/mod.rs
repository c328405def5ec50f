//! Configuration validation for bactmeasure.
//!
//! Runs once, before any image is read. It checks:
//! - Calibration sanity (every pixel dimension positive and finite)
//! - Size bounds (non-negative, ordered)
//! - Morphology and detection parameters (positive shell thickness and sigmas)
//! - Relation parameters (non-negative distance cutoff)
//!
//! Errors make [`ensure_valid`] fail; warnings are only logged.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use crate::config::{AnalysisConfig, AreaBounds};
use crate::error::BactError;
use crate::geom::Calibration;

/// Validates analysis parameters and returns a report of all issues found.
pub fn validate_config(config: &AnalysisConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    if let Some(size) = config.pixel_size {
        if !(size.is_finite() && size > 0.0) {
            report.add(ValidationIssue::error(
                IssueCode::NonPositivePixelSize,
                format!("Pixel size override {} must be positive", size),
                IssueContext::PixelSizeOverride,
            ));
        }
    }

    if let Some(area) = &config.bacteria.area {
        validate_bounds(area, "bacteria", &mut report);
    }
    validate_border(config, &mut report);
    validate_foci(config, &mut report);

    report
}

/// Validates a calibration, typically the one resolved for an image.
///
/// Shell thickness is checked against the XY pixel size here since the
/// ratio is only known once the calibration is.
pub fn validate_calibration(cal: &Calibration, config: &AnalysisConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    for (axis, value) in [
        ("width", cal.pixel_width),
        ("height", cal.pixel_height),
        ("depth", cal.pixel_depth),
    ] {
        if !(value.is_finite() && value > 0.0) {
            report.add(ValidationIssue::error(
                IssueCode::NonPositivePixelSize,
                format!("Pixel {} {} must be positive", axis, value),
                IssueContext::Calibration,
            ));
        }
    }

    let thickness = config.border.shell_thickness;
    if report.is_ok() && thickness > 0.0 && cal.voxels_xy(thickness) < 0.5 {
        report.add(ValidationIssue::warning(
            IssueCode::ShellThinnerThanHalfPixel,
            format!(
                "Shell thickness {} {} is under half a pixel ({} {}); borders will be empty",
                thickness,
                cal.unit_symbol(),
                cal.pixel_width,
                cal.unit_symbol()
            ),
            IssueContext::Section { name: "border" },
        ));
    }

    report
}

/// Logs warnings and turns errors into [`BactError::InvalidConfig`].
pub fn ensure_valid(report: ValidationReport) -> Result<(), BactError> {
    for issue in report.warnings() {
        log::warn!("{}", issue);
    }
    if report.is_ok() {
        Ok(())
    } else {
        Err(BactError::InvalidConfig {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    }
}

fn validate_bounds(bounds: &AreaBounds, section: &'static str, report: &mut ValidationReport) {
    let context = IssueContext::Section { name: section };
    let mut finite = true;
    for (which, value) in [("min", bounds.min), ("max", bounds.max)] {
        if !(value.is_finite() && value >= 0.0) {
            finite = false;
            report.add(ValidationIssue::error(
                IssueCode::NegativeAreaBound,
                format!("Area {} {} must be a non-negative number", which, value),
                context.clone(),
            ));
        }
    }
    if finite && bounds.min > bounds.max {
        report.add(ValidationIssue::error(
            IssueCode::InvertedAreaBounds,
            format!("Area min {} exceeds max {}", bounds.min, bounds.max),
            context,
        ));
    }
}

fn validate_border(config: &AnalysisConfig, report: &mut ValidationReport) {
    let border = &config.border;
    let context = IssueContext::Section { name: "border" };

    if !(border.shell_thickness.is_finite() && border.shell_thickness > 0.0) {
        report.add(ValidationIssue::error(
            IssueCode::NonPositiveShellThickness,
            format!(
                "Shell thickness {} must be positive",
                border.shell_thickness
            ),
            context.clone(),
        ));
    }

    if border.channel.trim().is_empty() {
        report.add(ValidationIssue::error(
            IssueCode::EmptyChannelName,
            "Border intensity channel name is empty",
            context,
        ));
    }
}

fn validate_foci(config: &AnalysisConfig, report: &mut ValidationReport) {
    let foci = &config.foci;
    let context = IssueContext::Section { name: "foci" };

    validate_bounds(&foci.area, "foci", report);

    let mut sigmas_ok = true;
    for (name, sigma) in [("sigma1", foci.sigma1), ("sigma2", foci.sigma2)] {
        if !(sigma.is_finite() && sigma > 0.0) {
            sigmas_ok = false;
            report.add(ValidationIssue::error(
                IssueCode::NonPositiveSigma,
                format!("{} {} must be positive", name, sigma),
                context.clone(),
            ));
        }
    }
    if sigmas_ok && foci.sigma1 >= foci.sigma2 {
        report.add(ValidationIssue::warning(
            IssueCode::SigmaOrder,
            format!(
                "sigma1 {} is not smaller than sigma2 {}; foci will appear dark",
                foci.sigma1, foci.sigma2
            ),
            context.clone(),
        ));
    }

    for (name, channel) in [("channel1", &foci.channel1), ("channel2", &foci.channel2)] {
        if channel.trim().is_empty() {
            report.add(ValidationIssue::error(
                IssueCode::EmptyChannelName,
                format!("Foci {} name is empty", name),
                context.clone(),
            ));
        }
    }
    if foci.channel1 == foci.channel2 {
        report.add(ValidationIssue::warning(
            IssueCode::SameFociChannels,
            format!("Both foci channels read '{}'", foci.channel1),
            context.clone(),
        ));
    }

    if !(foci.max_distance.is_finite() && foci.max_distance >= 0.0) {
        report.add(ValidationIssue::error(
            IssueCode::NegativeDistanceCutoff,
            format!(
                "Distance cutoff {} must be a non-negative number",
                foci.max_distance
            ),
            context.clone(),
        ));
    }

    if foci.max_reported_distances == 0 {
        report.add(ValidationIssue::warning(
            IssueCode::ZeroReportedDistances,
            "max_reported_distances is 0; distance rows will carry no cross-distances",
            context,
        ));
    }
}
