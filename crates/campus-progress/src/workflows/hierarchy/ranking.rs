use serde::{Deserialize, Serialize};

use super::domain::{HierarchyLevel, HierarchyNode, NodeStats};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    #[default]
    Top,
    Lowest,
}

impl RankOrder {
    pub const fn label(self) -> &'static str {
        match self {
            RankOrder::Top => "top",
            RankOrder::Lowest => "lowest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentRanking {
    pub institution_id: String,
    pub department_id: String,
    pub name: String,
    pub code: String,
    pub stats: NodeStats,
}

/// Departments across the forest ordered by completion percentage. Ties keep fetch order.
pub fn rank_departments(
    forest: &[HierarchyNode],
    order: RankOrder,
    limit: Option<usize>,
) -> Vec<DepartmentRanking> {
    let mut rankings: Vec<DepartmentRanking> = forest
        .iter()
        .flat_map(|institution| {
            institution
                .children
                .iter()
                .filter(|node| node.level == HierarchyLevel::Department)
                .map(move |department| DepartmentRanking {
                    institution_id: institution.id.clone(),
                    department_id: department.id.clone(),
                    name: department.name.clone(),
                    code: department.code.clone(),
                    stats: department.stats,
                })
        })
        .collect();

    // sort_by is stable
    match order {
        RankOrder::Top => rankings.sort_by(|a, b| {
            b.stats
                .completion_percentage
                .cmp(&a.stats.completion_percentage)
        }),
        RankOrder::Lowest => rankings.sort_by(|a, b| {
            a.stats
                .completion_percentage
                .cmp(&b.stats.completion_percentage)
        }),
    }

    if let Some(limit) = limit {
        rankings.truncate(limit);
    }
    rankings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn department(id: &str, total: usize, participating: usize) -> HierarchyNode {
        HierarchyNode {
            level: HierarchyLevel::Department,
            id: id.to_string(),
            name: id.to_uppercase(),
            code: String::new(),
            stats: NodeStats::from_counts(total, participating, participating),
            children: Vec::new(),
            learners: Vec::new(),
        }
    }

    fn forest() -> Vec<HierarchyNode> {
        vec![
            HierarchyNode::branch(
                HierarchyLevel::Institution,
                "north".to_string(),
                "North Campus".to_string(),
                String::new(),
                vec![department("art", 4, 2), department("bio", 10, 9)],
            ),
            HierarchyNode::branch(
                HierarchyLevel::Institution,
                "south".to_string(),
                "South Campus".to_string(),
                String::new(),
                vec![department("cs", 2, 1), department("eco", 5, 5)],
            ),
        ]
    }

    fn ids(rankings: &[DepartmentRanking]) -> Vec<&str> {
        rankings
            .iter()
            .map(|ranking| ranking.department_id.as_str())
            .collect()
    }

    #[test]
    fn top_orders_descending_with_stable_ties() {
        let rankings = rank_departments(&forest(), RankOrder::Top, None);
        assert_eq!(ids(&rankings), vec!["eco", "bio", "art", "cs"]);
    }

    #[test]
    fn lowest_orders_ascending_with_stable_ties() {
        let rankings = rank_departments(&forest(), RankOrder::Lowest, Some(3));
        assert_eq!(ids(&rankings), vec!["art", "cs", "bio"]);
        assert_eq!(rankings[0].institution_id, "north");
    }
}
