use serde::{Deserialize, Serialize};

use crate::workflows::assessments::domain::{
    AttemptRecord, LearnerId, ResolvedItem, SubjectEnrollment, SubmissionRecord,
};

/// Raw institution as returned by the hierarchy fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub departments: Vec<DepartmentRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub years: Vec<YearRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub learners: Vec<LearnerRecord>,
}

/// A learner with every related record delivered inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerRecord {
    pub learner_id: LearnerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<SubjectEnrollment>,
    #[serde(default)]
    pub submissions: Vec<SubmissionRecord>,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    Institution,
    Department,
    Year,
    Section,
}

impl HierarchyLevel {
    pub const fn label(self) -> &'static str {
        match self {
            HierarchyLevel::Institution => "institution",
            HierarchyLevel::Department => "department",
            HierarchyLevel::Year => "year",
            HierarchyLevel::Section => "section",
        }
    }
}

/// Raw counts plus the percentage derived from them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeStats {
    pub total_learners: usize,
    pub active_learners: usize,
    pub participating_learners: usize,
    pub completion_percentage: u8,
}

impl NodeStats {
    pub fn from_learners(learners: &[LearnerProgress]) -> Self {
        let total = learners.len();
        let active = learners.iter().filter(|learner| learner.active).count();
        let participating = learners
            .iter()
            .filter(|learner| learner.participating)
            .count();
        Self::from_counts(total, active, participating)
    }

    /// Sums children's raw counts and recomputes the percentage from the sums.
    pub fn sum<'a>(children: impl IntoIterator<Item = &'a NodeStats>) -> Self {
        let (total, active, participating) =
            children
                .into_iter()
                .fold((0, 0, 0), |(total, active, participating), stats| {
                    (
                        total + stats.total_learners,
                        active + stats.active_learners,
                        participating + stats.participating_learners,
                    )
                });
        Self::from_counts(total, active, participating)
    }

    pub fn from_counts(total: usize, active: usize, participating: usize) -> Self {
        Self {
            total_learners: total,
            active_learners: active,
            participating_learners: participating,
            completion_percentage: completion_percentage(participating, total),
        }
    }
}

/// `participating / total × 100`, rounded half up; 0 for an empty node.
pub fn completion_percentage(participating: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let participating = participating.min(total) as u64;
    let total = total as u64;
    ((participating * 200 + total) / (total * 2)) as u8
}

/// Per-learner roll-up input derived from resolved items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearnerProgress {
    pub learner_id: LearnerId,
    pub name: String,
    pub total_items: usize,
    pub engaged_items: usize,
    pub active: bool,
    pub participating: bool,
}

impl LearnerProgress {
    pub fn from_items(learner_id: LearnerId, name: String, items: &[ResolvedItem]) -> Self {
        let total_items = items.len();
        let engaged_items = items
            .iter()
            .filter(|item| item.status().is_engaged())
            .count();
        Self {
            learner_id,
            name,
            total_items,
            engaged_items,
            active: engaged_items > 0,
            participating: total_items > 0 && engaged_items == total_items,
        }
    }
}

/// Aggregated node of the institution → department → year → section forest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub level: HierarchyLevel,
    pub id: String,
    pub name: String,
    pub code: String,
    pub stats: NodeStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub learners: Vec<LearnerProgress>,
}

impl HierarchyNode {
    pub fn section(id: String, name: String, code: String, learners: Vec<LearnerProgress>) -> Self {
        Self {
            level: HierarchyLevel::Section,
            id,
            name,
            code,
            stats: NodeStats::from_learners(&learners),
            children: Vec::new(),
            learners,
        }
    }

    pub fn branch(
        level: HierarchyLevel,
        id: String,
        name: String,
        code: String,
        children: Vec<HierarchyNode>,
    ) -> Self {
        Self {
            level,
            id,
            name,
            code,
            stats: NodeStats::sum(children.iter().map(|child| &child.stats)),
            children,
            learners: Vec::new(),
        }
    }

    /// Copy of this node's identity with different children; stats recomputed.
    pub(crate) fn with_children(&self, children: Vec<HierarchyNode>) -> Self {
        Self::branch(
            self.level,
            self.id.clone(),
            self.name.clone(),
            self.code.clone(),
            children,
        )
    }

    /// Learner count summed from the section leaves below this node.
    pub fn leaf_learner_total(&self) -> usize {
        match self.level {
            HierarchyLevel::Section => self.learners.len(),
            HierarchyLevel::Institution | HierarchyLevel::Department | HierarchyLevel::Year => {
                self.children.iter().map(Self::leaf_learner_total).sum()
            }
        }
    }

    /// Depth-first visit of this node and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a HierarchyNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}
