use serde::{Deserialize, Serialize};

use super::domain::HierarchyNode;
use crate::workflows::assessments::filter::{contains_any, search_needle};

/// Supervisor-facing filter. A section is kept only if its full path satisfies every supplied
/// predicate; `Some(0)` for `min_completion` is a real constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub year_id: Option<String>,
    #[serde(default)]
    pub section_id: Option<String>,
    #[serde(default)]
    pub min_completion: Option<u8>,
}

impl HierarchyFilter {
    pub fn is_empty(&self) -> bool {
        search_needle(self.search.as_deref()).is_none()
            && self.department_id.is_none()
            && self.year_id.is_none()
            && self.section_id.is_none()
            && self.min_completion.is_none()
    }

    /// Returns a pruned copy of the forest with ancestor stats recomputed from the kept
    /// sections. Without constraints the forest is returned unchanged, empty branches
    /// included; otherwise branches left without sections are dropped.
    pub fn apply(&self, forest: &[HierarchyNode]) -> Vec<HierarchyNode> {
        if self.is_empty() {
            return forest.to_vec();
        }
        let needle = search_needle(self.search.as_deref());

        forest
            .iter()
            .filter_map(|institution| {
                let departments: Vec<HierarchyNode> = institution
                    .children
                    .iter()
                    .filter(|department| id_matches(&self.department_id, department))
                    .filter_map(|department| {
                        let years: Vec<HierarchyNode> = department
                            .children
                            .iter()
                            .filter(|year| id_matches(&self.year_id, year))
                            .filter_map(|year| {
                                let sections: Vec<HierarchyNode> = year
                                    .children
                                    .iter()
                                    .filter(|section| {
                                        id_matches(&self.section_id, section)
                                            && self.completion_matches(section)
                                            && path_matches(
                                                needle.as_deref(),
                                                [institution, department, year, *section],
                                            )
                                    })
                                    .cloned()
                                    .collect();
                                non_empty(year, sections)
                            })
                            .collect();
                        non_empty(department, years)
                    })
                    .collect();
                non_empty(institution, departments)
            })
            .collect()
    }

    fn completion_matches(&self, section: &HierarchyNode) -> bool {
        self.min_completion
            .map_or(true, |min| section.stats.completion_percentage >= min)
    }
}

fn id_matches(expected: &Option<String>, node: &HierarchyNode) -> bool {
    expected.as_ref().map_or(true, |id| &node.id == id)
}

fn path_matches(needle: Option<&str>, path: [&HierarchyNode; 4]) -> bool {
    let Some(needle) = needle else {
        return true;
    };
    path.iter().any(|node| {
        contains_any(
            &[node.name.as_str(), node.code.as_str(), node.id.as_str()],
            needle,
        )
    })
}

fn non_empty(node: &HierarchyNode, children: Vec<HierarchyNode>) -> Option<HierarchyNode> {
    if children.is_empty() {
        None
    } else {
        Some(node.with_children(children))
    }
}
