use crate::infra::{load_source, FixtureSource};
use campus_progress::config::{AppConfig, PipelineConfig};
use campus_progress::error::AppError;
use campus_progress::workflows::assessments::{
    AssessmentKind, ItemFilter, ItemState, ItemStatus, LearnerId, LearnerSession, LearnerSnapshot,
    ResolvedItem,
};
use campus_progress::workflows::hierarchy::{
    DepartmentRanking, HierarchyDashboard, HierarchyFilter, HierarchyNode, RankOrder,
};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OrderArg {
    Top,
    Lowest,
}

impl From<OrderArg> for RankOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Top => RankOrder::Top,
            OrderArg::Lowest => RankOrder::Lowest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum StatusArg {
    Pending,
    Submitted,
    Graded,
    Locked,
    Available,
    InProgress,
    Completed,
}

impl From<StatusArg> for ItemStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Pending => ItemStatus::Pending,
            StatusArg::Submitted => ItemStatus::Submitted,
            StatusArg::Graded => ItemStatus::Graded,
            StatusArg::Locked => ItemStatus::Locked,
            StatusArg::Available => ItemStatus::Available,
            StatusArg::InProgress => ItemStatus::InProgress,
            StatusArg::Completed => ItemStatus::Completed,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct LearnerReportArgs {
    /// Learner identifier as it appears in the campus fixture
    #[arg(long)]
    pub(crate) learner: String,
    /// Campus fixture (defaults to PROGRESS_FIXTURE or the built-in sample)
    #[arg(long)]
    pub(crate) fixture: Option<PathBuf>,
    /// Case-insensitive text matched against title, subject name, subject code and id
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Only list items in this status
    #[arg(long, value_enum)]
    pub(crate) status: Option<StatusArg>,
    /// Only list examinations
    #[arg(long)]
    pub(crate) exams_only: bool,
}

#[derive(Args, Debug)]
pub(crate) struct HierarchyReportArgs {
    /// Campus fixture (defaults to PROGRESS_FIXTURE or the built-in sample)
    #[arg(long)]
    pub(crate) fixture: Option<PathBuf>,
    /// Case-insensitive text matched against any node on a section's path
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Keep only this department
    #[arg(long)]
    pub(crate) department: Option<String>,
    /// Keep sections at or above this completion percentage
    #[arg(long)]
    pub(crate) min_completion: Option<u8>,
    /// Department ranking direction
    #[arg(long, value_enum, default_value = "top")]
    pub(crate) order: OrderArg,
    /// Number of departments to rank
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Also write the department ranking to this CSV file
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Campus fixture (defaults to PROGRESS_FIXTURE or the built-in sample)
    #[arg(long)]
    pub(crate) fixture: Option<PathBuf>,
    /// Learner to feature; defaults to the first learner in the fixture
    #[arg(long)]
    pub(crate) learner: Option<String>,
}

/// One CSV row of the department ranking.
#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct RankingRow {
    pub(crate) rank: usize,
    pub(crate) institution_id: String,
    pub(crate) department_id: String,
    pub(crate) department: String,
    pub(crate) code: String,
    pub(crate) total_learners: usize,
    pub(crate) active_learners: usize,
    pub(crate) participating_learners: usize,
    pub(crate) completion_percentage: u8,
}

impl RankingRow {
    fn from_ranking(rank: usize, ranking: &DepartmentRanking) -> Self {
        Self {
            rank,
            institution_id: ranking.institution_id.clone(),
            department_id: ranking.department_id.clone(),
            department: ranking.name.clone(),
            code: ranking.code.clone(),
            total_learners: ranking.stats.total_learners,
            active_learners: ranking.stats.active_learners,
            participating_learners: ranking.stats.participating_learners,
            completion_percentage: ranking.stats.completion_percentage,
        }
    }
}

fn pipeline_config(fixture: Option<PathBuf>) -> Result<PipelineConfig, AppError> {
    let mut pipeline = AppConfig::load()?.pipeline;
    if let Some(path) = fixture {
        pipeline.fixture_path = Some(path);
    }
    Ok(pipeline)
}

pub(crate) async fn run_learner_report(args: LearnerReportArgs) -> Result<(), AppError> {
    let LearnerReportArgs {
        learner,
        fixture,
        search,
        status,
        exams_only,
    } = args;

    let pipeline = pipeline_config(fixture)?;
    let source = load_source(&pipeline)?;
    let learner_id = LearnerId(learner);
    let snapshot = learner_snapshot(&source, pipeline, learner_id).await?;

    let filter = ItemFilter {
        search,
        status: status.map(ItemStatus::from),
        kind: exams_only.then_some(AssessmentKind::Examination),
        ..ItemFilter::default()
    };
    render_learner(&source, &snapshot, &filter);
    Ok(())
}

pub(crate) async fn run_hierarchy_report(args: HierarchyReportArgs) -> Result<(), AppError> {
    let HierarchyReportArgs {
        fixture,
        search,
        department,
        min_completion,
        order,
        limit,
        csv,
    } = args;

    let pipeline = pipeline_config(fixture)?;
    let source = load_source(&pipeline)?;
    let filter = HierarchyFilter {
        search,
        department_id: department,
        min_completion,
        ..HierarchyFilter::default()
    };

    let dashboard = HierarchyDashboard::new(source);
    let snapshot = dashboard.refresh(filter).await?;
    render_tree(&snapshot.nodes);

    let order = RankOrder::from(order);
    let rankings = dashboard.rankings(order, limit).unwrap_or_default();
    render_rankings(order, &rankings);

    if let Some(path) = csv {
        let rows = ranking_rows(&rankings);
        write_rankings_csv(&path, &rows)?;
        println!("\nRanking written to {}", path.display());
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { fixture, learner } = args;

    let pipeline = pipeline_config(fixture)?;
    let source = load_source(&pipeline)?;
    let learner_id = match learner {
        Some(id) => LearnerId(id),
        None => match source.learner_ids().into_iter().next() {
            Some(id) => id,
            None => {
                println!("Campus fixture has no learners; nothing to demo.");
                return Ok(());
            }
        },
    };

    println!("Campus progress demo");
    println!("====================");
    let snapshot = learner_snapshot(&source, pipeline, learner_id).await?;
    render_learner(&source, &snapshot, &ItemFilter::default());

    let dashboard = HierarchyDashboard::new(Arc::clone(&source));
    let hierarchy = dashboard.refresh(HierarchyFilter::default()).await?;
    println!("\nSupervisor view");
    render_tree(&hierarchy.nodes);
    for order in [RankOrder::Top, RankOrder::Lowest] {
        let rankings = dashboard.rankings(order, Some(3)).unwrap_or_default();
        render_rankings(order, &rankings);
    }
    Ok(())
}

async fn learner_snapshot(
    source: &Arc<FixtureSource>,
    pipeline: PipelineConfig,
    learner_id: LearnerId,
) -> Result<Arc<LearnerSnapshot>, AppError> {
    let session = LearnerSession::new(Arc::clone(source), pipeline);
    session.switch_learner(learner_id);
    Ok(session.refresh().await?)
}

fn render_learner(source: &FixtureSource, snapshot: &LearnerSnapshot, filter: &ItemFilter) {
    let name = source
        .learner_name(&snapshot.learner_id)
        .filter(|name| !name.is_empty())
        .unwrap_or("unknown learner");
    println!("\nLearner {} ({})", snapshot.learner_id, name);

    let summary = &snapshot.summary;
    println!(
        "- {} items | {} pending | {} submitted | {} graded",
        summary.total, summary.pending, summary.submitted, summary.graded
    );
    println!(
        "- {} locked | {} available | {} in progress | {} completed",
        summary.locked, summary.available, summary.in_progress, summary.completed
    );

    let items = filter.apply(&snapshot.items);
    if items.is_empty() {
        println!("\nNo items match the current filter");
        return;
    }
    println!("\nItems");
    for item in &items {
        println!("  {}", item_line(item));
    }
}

pub(crate) fn item_line(item: &ResolvedItem) -> String {
    let subject = if item.subject_code.is_empty() {
        item.subject_id.to_string()
    } else {
        item.subject_code.clone()
    };
    let mut line = format!(
        "[{:<11}] {:<12} {} ({})",
        item.status().label(),
        item.kind.label(),
        item.title,
        subject
    );

    match &item.state {
        ItemState::Examination(_) => {
            if let Some(outcome) = item.state.outcome() {
                if let Some(percentage) = outcome.percentage {
                    line.push_str(&format!(" | {percentage:.1}%"));
                }
                match outcome.is_passed {
                    Some(true) => line.push_str(" | passed"),
                    Some(false) => line.push_str(" | not passed"),
                    None => {}
                }
            }
        }
        ItemState::Assignment(_) => {
            if let Some(score) = item.derived_score {
                line.push_str(&format!(" | score {score}"));
            }
            if let Some(days) = item.days_remaining {
                if item.status() == ItemStatus::Pending {
                    line.push_str(&format!(" | {days} days remaining"));
                }
            }
        }
    }
    line
}

fn render_tree(nodes: &[HierarchyNode]) {
    if nodes.is_empty() {
        println!("\nNo sections match the current filter");
        return;
    }
    println!();
    for node in nodes {
        render_node(node, 0);
    }
}

fn render_node(node: &HierarchyNode, depth: usize) {
    let stats = &node.stats;
    println!(
        "{:indent$}{} {}: {}% complete ({} of {} participating, {} active)",
        "",
        node.level.label(),
        node.name,
        stats.completion_percentage,
        stats.participating_learners,
        stats.total_learners,
        stats.active_learners,
        indent = depth * 2
    );
    for child in &node.children {
        render_node(child, depth + 1);
    }
}

fn render_rankings(order: RankOrder, rankings: &[DepartmentRanking]) {
    let heading = match order {
        RankOrder::Top => "Top performing departments",
        RankOrder::Lowest => "Lowest performing departments",
    };
    println!("\n{heading}");
    if rankings.is_empty() {
        println!("- none");
        return;
    }
    for (index, ranking) in rankings.iter().enumerate() {
        println!(
            "{}. {} ({}%, {} learners)",
            index + 1,
            ranking.name,
            ranking.stats.completion_percentage,
            ranking.stats.total_learners
        );
    }
}

pub(crate) fn ranking_rows(rankings: &[DepartmentRanking]) -> Vec<RankingRow> {
    rankings
        .iter()
        .enumerate()
        .map(|(index, ranking)| RankingRow::from_ranking(index + 1, ranking))
        .collect()
}

pub(crate) fn write_rankings<W: Write>(writer: W, rows: &[RankingRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row).map_err(std::io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_rankings_csv(path: &Path, rows: &[RankingRow]) -> Result<(), AppError> {
    let file = std::fs::File::create(path)?;
    write_rankings(file, rows)
}
