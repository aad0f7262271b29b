// Entity Models
//
// Student is the only entity: the official roster is the ground truth and every
// other source is matched against it.

pub mod student;

pub use student::{roster_from_pairs, AttendanceEvidence, AttendanceFlag, SourceEvidence, Student};
