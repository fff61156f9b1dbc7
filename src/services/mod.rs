pub mod advisor;
pub mod averaging;
pub mod extractor;

pub use advisor::{Advice, AdviceStatus, AdvisorService};
pub use averaging::{derive, DerivedAverages, PointsBalance, PASSING_GRADE};
pub use extractor::GradeExtractor;
