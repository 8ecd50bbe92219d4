use super::domain::{AssessmentDefinition, AssessmentKind, CompletionRecord, SubjectEnrollment, SubjectId};

/// One assessment paired with the subject it was published under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatItem<'a> {
    pub subject: &'a SubjectEnrollment,
    pub definition: &'a AssessmentDefinition,
    pub kind: AssessmentKind,
}

impl<'a> FlatItem<'a> {
    pub fn subject_id(&self) -> &'a SubjectId {
        &self.subject.subject_id
    }

    pub fn subject_name(&self) -> &'a str {
        self.subject.subject_name.as_deref().unwrap_or("")
    }

    pub fn subject_code(&self) -> &'a str {
        self.subject.subject_code.as_deref().unwrap_or("")
    }

    pub fn completion(&self) -> CompletionRecord {
        self.subject.completion()
    }
}

/// Lazily walks subjects in order, yielding each subject's assignments and then its
/// examinations in source order. The iterator borrows its input and can be cloned before
/// consumption to replay the same sequence.
pub fn flatten(subjects: &[SubjectEnrollment]) -> impl Iterator<Item = FlatItem<'_>> + Clone {
    subjects.iter().flat_map(|subject| {
        let assignments = subject.assignments.iter().map(move |definition| FlatItem {
            subject,
            definition,
            kind: AssessmentKind::Assignment,
        });
        let examinations = subject.examinations.iter().map(move |definition| FlatItem {
            subject,
            definition,
            kind: AssessmentKind::Examination,
        });
        assignments.chain(examinations)
    })
}

/// Flattened items restricted to one kind.
pub fn flatten_kind(
    subjects: &[SubjectEnrollment],
    kind: AssessmentKind,
) -> impl Iterator<Item = FlatItem<'_>> + Clone {
    flatten(subjects).filter(move |item| item.kind == kind)
}
