//! The staging area: readiness detection, isolated copies, and the purge
//! that reclaims them after a successful submission.

pub mod copier;
pub mod reclaimer;
pub mod stabilizer;

pub use copier::{StagingCopier, archival_name};
pub use reclaimer::{PurgeReport, purge};
pub use stabilizer::{FileStabilizer, OpenReadProbe, ReadProbe};
