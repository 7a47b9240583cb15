//! Explicit cascade deletion along the ownership edges.
//!
//! Nothing here relies on `ON DELETE CASCADE`: every traversal collects the
//! affected ids itself and deletes leaf tables first, all inside one
//! transaction, so the set of removed rows is exactly what the report says.

use crate::entities::{project, requirement, requirement_use_case, scenario, use_case, user};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, instrument};

/// Number of rows removed per table by one cascade.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeReport {
    pub users: u64,
    pub projects: u64,
    pub requirements: u64,
    pub use_cases: u64,
    pub scenarios: u64,
    pub relations: u64,
}

/// Deletes a user together with every project it owns.
#[instrument(skip(db))]
pub async fn delete_user<C: TransactionTrait>(db: &C, user_id: i32) -> Result<CascadeReport, DbErr> {
    let txn = db.begin().await?;
    let mut report = CascadeReport::default();

    let project_ids: Vec<i32> = project::Entity::find()
        .select_only()
        .column(project::Column::Id)
        .filter(project::Column::OwnerId.eq(user_id))
        .into_tuple()
        .all(&txn)
        .await?;

    for project_id in project_ids {
        purge_project(&txn, project_id, &mut report).await?;
    }
    report.users += user::Entity::delete_by_id(user_id)
        .exec(&txn)
        .await?
        .rows_affected;

    txn.commit().await?;
    debug!(?report, "User cascade finished");
    Ok(report)
}

/// Deletes a project with all of its requirements, use cases, scenarios and
/// relation rows.
#[instrument(skip(db))]
pub async fn delete_project<C: TransactionTrait>(
    db: &C,
    project_id: i32,
) -> Result<CascadeReport, DbErr> {
    let txn = db.begin().await?;
    let mut report = CascadeReport::default();
    purge_project(&txn, project_id, &mut report).await?;
    txn.commit().await?;
    debug!(?report, "Project cascade finished");
    Ok(report)
}

/// Deletes a requirement, every requirement refining it (transitively), and
/// everything hanging off those requirements.
#[instrument(skip(db, root), fields(requirement_id = root.id))]
pub async fn delete_requirement<C: TransactionTrait>(
    db: &C,
    root: &requirement::Model,
) -> Result<CascadeReport, DbErr> {
    let txn = db.begin().await?;
    let mut report = CascadeReport::default();
    let ids = requirement_subtree(&txn, root.project_id, root.id).await?;
    purge_requirements(&txn, &ids, &mut report).await?;
    txn.commit().await?;
    debug!(?report, "Requirement cascade finished");
    Ok(report)
}

/// Deletes a use case with its scenarios and relation rows.
#[instrument(skip(db))]
pub async fn delete_use_case<C: TransactionTrait>(
    db: &C,
    use_case_id: i32,
) -> Result<CascadeReport, DbErr> {
    let txn = db.begin().await?;
    let mut report = CascadeReport::default();
    purge_use_cases(&txn, &[use_case_id], &mut report).await?;
    txn.commit().await?;
    debug!(?report, "Use case cascade finished");
    Ok(report)
}

/// Collects the ids of `root` and all of its dependents, breadth-first.
///
/// The project's requirements are loaded once and indexed by parent id. The
/// visited set bounds the walk by the number of rows even if the stored
/// parent links contain a cycle.
pub async fn requirement_subtree<C: ConnectionTrait>(
    db: &C,
    project_id: i32,
    root: i32,
) -> Result<Vec<i32>, DbErr> {
    let rows: Vec<(i32, Option<i32>)> = requirement::Entity::find()
        .select_only()
        .column(requirement::Column::Id)
        .column(requirement::Column::ParentId)
        .filter(requirement::Column::ProjectId.eq(project_id))
        .into_tuple()
        .all(db)
        .await?;

    let mut children: HashMap<i32, Vec<i32>> = HashMap::new();
    for (id, parent_id) in rows {
        if let Some(parent_id) = parent_id {
            children.entry(parent_id).or_default().push(id);
        }
    }

    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        order.push(id);
        if let Some(kids) = children.get(&id) {
            queue.extend(kids.iter().copied());
        }
    }

    Ok(order)
}

async fn purge_project<C: ConnectionTrait>(
    db: &C,
    project_id: i32,
    report: &mut CascadeReport,
) -> Result<(), DbErr> {
    let requirement_ids: Vec<i32> = requirement::Entity::find()
        .select_only()
        .column(requirement::Column::Id)
        .filter(requirement::Column::ProjectId.eq(project_id))
        .into_tuple()
        .all(db)
        .await?;
    purge_requirements(db, &requirement_ids, report).await?;

    // Use cases that do not trace to any requirement are still project-owned.
    let use_case_ids: Vec<i32> = use_case::Entity::find()
        .select_only()
        .column(use_case::Column::Id)
        .filter(use_case::Column::ProjectId.eq(project_id))
        .into_tuple()
        .all(db)
        .await?;
    purge_use_cases(db, &use_case_ids, report).await?;

    report.projects += project::Entity::delete_by_id(project_id)
        .exec(db)
        .await?
        .rows_affected;
    Ok(())
}

async fn purge_requirements<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
    report: &mut CascadeReport,
) -> Result<(), DbErr> {
    if ids.is_empty() {
        return Ok(());
    }

    let use_case_ids: Vec<i32> = use_case::Entity::find()
        .select_only()
        .column(use_case::Column::Id)
        .filter(use_case::Column::RequirementId.is_in(ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    purge_use_cases(db, &use_case_ids, report).await?;

    report.relations += requirement_use_case::Entity::delete_many()
        .filter(requirement_use_case::Column::RequirementId.is_in(ids.iter().copied()))
        .exec(db)
        .await?
        .rows_affected;
    // One statement for the whole subtree, so the self-reference never dangles
    // between statements.
    report.requirements += requirement::Entity::delete_many()
        .filter(requirement::Column::Id.is_in(ids.iter().copied()))
        .exec(db)
        .await?
        .rows_affected;
    Ok(())
}

async fn purge_use_cases<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
    report: &mut CascadeReport,
) -> Result<(), DbErr> {
    if ids.is_empty() {
        return Ok(());
    }

    report.scenarios += scenario::Entity::delete_many()
        .filter(scenario::Column::UseCaseId.is_in(ids.iter().copied()))
        .exec(db)
        .await?
        .rows_affected;
    report.relations += requirement_use_case::Entity::delete_many()
        .filter(requirement_use_case::Column::UseCaseId.is_in(ids.iter().copied()))
        .exec(db)
        .await?
        .rows_affected;
    report.use_cases += use_case::Entity::delete_many()
        .filter(use_case::Column::Id.is_in(ids.iter().copied()))
        .exec(db)
        .await?
        .rows_affected;
    Ok(())
}
