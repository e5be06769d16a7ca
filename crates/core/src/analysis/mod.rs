//! Band math, severity classification and zonal area statistics

pub mod area;
pub mod nbr;
pub mod severity;

pub use area::{class_areas, AreaSummary, ClassArea};
pub use nbr::{dnbr, nbr, normalized_difference};
pub use severity::{classify, SeverityClass, SEVERITY_BREAKS};
