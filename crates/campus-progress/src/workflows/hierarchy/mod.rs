//! Supervisor view: per-learner resolution rolled up through
//! institution → department → year → section.

pub mod aggregate;
pub mod dashboard;
pub mod domain;
pub mod filter;
pub mod ranking;
pub mod router;

pub use aggregate::{aggregate, resolve_learner};
pub use dashboard::{HierarchyDashboard, HierarchySnapshot};
pub use domain::{
    completion_percentage, DepartmentRecord, HierarchyLevel, HierarchyNode, InstitutionRecord,
    LearnerProgress, LearnerRecord, NodeStats, SectionRecord, YearRecord,
};
pub use filter::HierarchyFilter;
pub use ranking::{rank_departments, DepartmentRanking, RankOrder};
pub use router::hierarchy_router;

#[cfg(test)]
mod tests;
