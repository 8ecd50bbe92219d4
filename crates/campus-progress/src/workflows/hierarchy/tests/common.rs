use std::sync::Arc;

use crate::workflows::assessments::domain::LearnerId;
use crate::workflows::hierarchy::dashboard::HierarchyDashboard;
use crate::workflows::hierarchy::domain::{
    DepartmentRecord, InstitutionRecord, LearnerRecord, SectionRecord, YearRecord,
};
use crate::workflows::testing::{assignment, subject, submitted, MemorySource};

pub(super) use crate::workflows::testing::{now, read_json_body};

/// Learner with a single assignment, submitted when `participating`.
pub(super) fn learner(id: &str, participating: bool) -> LearnerRecord {
    LearnerRecord {
        learner_id: LearnerId(id.to_string()),
        name: format!("Learner {id}"),
        subjects: vec![subject(
            "core",
            Some(50.0),
            vec![assignment("core-hw", "Weekly reflection")],
            Vec::new(),
        )],
        submissions: if participating {
            vec![submitted("core-hw")]
        } else {
            Vec::new()
        },
        attempts: Vec::new(),
    }
}

pub(super) fn section(id: &str, total: usize, participating: usize) -> SectionRecord {
    SectionRecord {
        id: id.to_string(),
        name: format!("Section {}", id.to_uppercase()),
        code: None,
        learners: (0..total)
            .map(|index| learner(&format!("{id}-{index}"), index < participating))
            .collect(),
    }
}

pub(super) fn department(id: &str, name: &str, sections: Vec<SectionRecord>) -> DepartmentRecord {
    DepartmentRecord {
        id: id.to_string(),
        name: name.to_string(),
        code: Some(id.to_uppercase()),
        years: vec![YearRecord {
            id: format!("{id}-y1"),
            name: "Year 1".to_string(),
            code: None,
            sections,
        }],
    }
}

/// Engineering: (10, 8) + (5, 5) → 87. Nursing: (4, 1) → 25. Law: (4, 2) → 50.
pub(super) fn campus() -> Vec<InstitutionRecord> {
    vec![InstitutionRecord {
        id: "riverside".to_string(),
        name: "Riverside Polytechnic".to_string(),
        code: Some("RVP".to_string()),
        departments: vec![
            department(
                "eng",
                "Engineering",
                vec![section("eng-a", 10, 8), section("eng-b", 5, 5)],
            ),
            department("nur", "Nursing", vec![section("nur-a", 4, 1)]),
            department("law", "Law", vec![section("law-a", 4, 2)]),
        ],
    }]
}

pub(super) fn dashboard_for(
    forest: Vec<InstitutionRecord>,
) -> (Arc<HierarchyDashboard<MemorySource>>, Arc<MemorySource>) {
    let source = Arc::new(MemorySource::default());
    source.set_hierarchy(forest);
    (
        Arc::new(HierarchyDashboard::new(Arc::clone(&source))),
        source,
    )
}
