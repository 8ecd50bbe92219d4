use chrono::{DateTime, Utc};

use super::domain::{
    DepartmentRecord, HierarchyLevel, HierarchyNode, InstitutionRecord, LearnerProgress,
    LearnerRecord, SectionRecord, YearRecord,
};
use crate::workflows::assessments::cache::PassCache;
use crate::workflows::assessments::domain::ResolvedItem;
use crate::workflows::assessments::resolve::resolve_settled;

/// Resolves one learner's inline records with the same resolver the learner view uses.
pub fn resolve_learner(record: &LearnerRecord, now: DateTime<Utc>) -> Vec<ResolvedItem> {
    let cache = PassCache::from_records(
        record.learner_id.clone(),
        0,
        &record.subjects,
        &record.submissions,
        &record.attempts,
    );
    resolve_settled(&record.subjects, &cache, now)
}

/// Rebuilds the whole aggregated forest. Sections count their learners directly; every
/// ancestor sums raw counts from its children.
pub fn aggregate(forest: &[InstitutionRecord], now: DateTime<Utc>) -> Vec<HierarchyNode> {
    forest
        .iter()
        .map(|institution| institution_node(institution, now))
        .collect()
}

fn institution_node(record: &InstitutionRecord, now: DateTime<Utc>) -> HierarchyNode {
    let children = record
        .departments
        .iter()
        .map(|department| department_node(department, now))
        .collect();
    HierarchyNode::branch(
        HierarchyLevel::Institution,
        record.id.clone(),
        record.name.clone(),
        record.code.clone().unwrap_or_default(),
        children,
    )
}

fn department_node(record: &DepartmentRecord, now: DateTime<Utc>) -> HierarchyNode {
    let children = record
        .years
        .iter()
        .map(|year| year_node(year, now))
        .collect();
    HierarchyNode::branch(
        HierarchyLevel::Department,
        record.id.clone(),
        record.name.clone(),
        record.code.clone().unwrap_or_default(),
        children,
    )
}

fn year_node(record: &YearRecord, now: DateTime<Utc>) -> HierarchyNode {
    let children = record
        .sections
        .iter()
        .map(|section| section_node(section, now))
        .collect();
    HierarchyNode::branch(
        HierarchyLevel::Year,
        record.id.clone(),
        record.name.clone(),
        record.code.clone().unwrap_or_default(),
        children,
    )
}

fn section_node(record: &SectionRecord, now: DateTime<Utc>) -> HierarchyNode {
    let learners = record
        .learners
        .iter()
        .map(|learner| {
            let items = resolve_learner(learner, now);
            LearnerProgress::from_items(learner.learner_id.clone(), learner.name.clone(), &items)
        })
        .collect();
    HierarchyNode::section(
        record.id.clone(),
        record.name.clone(),
        record.code.clone().unwrap_or_default(),
        learners,
    )
}
