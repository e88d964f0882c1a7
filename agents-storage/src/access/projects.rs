//! Projects.

use agents_core::{
    AgentsResult, Paginated, Pagination, Project, ProjectScope, ProjectUpdate, TenantScope,
};
use tracing::debug;

use crate::repository;
use crate::store::Store;
use crate::table::{Filter, ALL_TABLES, PROJECTS};

fn key(scope: &ProjectScope) -> Filter {
    Filter::tenant(&scope.tenant()).with("id", scope.project_id.as_str())
}

pub async fn get_project(store: &dyn Store, scope: &ProjectScope) -> AgentsResult<Option<Project>> {
    repository::get(store, &key(scope)).await
}

pub async fn project_exists(store: &dyn Store, scope: &ProjectScope) -> AgentsResult<bool> {
    Ok(store.count(&PROJECTS, &key(scope)).await? > 0)
}

pub async fn list_projects(store: &dyn Store, tenant: &TenantScope) -> AgentsResult<Vec<Project>> {
    repository::list(store, &Filter::tenant(tenant)).await
}

pub async fn list_projects_paginated(
    store: &dyn Store,
    tenant: &TenantScope,
    pagination: Pagination,
) -> AgentsResult<Paginated<Project>> {
    repository::list_paginated(store, &Filter::tenant(tenant), pagination).await
}

pub async fn create_project(store: &dyn Store, project: Project) -> AgentsResult<Project> {
    repository::create(store, project).await
}

pub async fn upsert_project(store: &dyn Store, project: Project) -> AgentsResult<Project> {
    repository::upsert(store, project).await
}

pub async fn update_project(
    store: &dyn Store,
    scope: &ProjectScope,
    update: ProjectUpdate,
) -> AgentsResult<Project> {
    repository::update(store, &key(scope), |project: &mut Project| update.apply(project)).await
}

/// Delete a project and every row scoped to it. Returns `false` when the
/// project did not exist.
pub async fn delete_project(store: &dyn Store, scope: &ProjectScope) -> AgentsResult<bool> {
    if !project_exists(store, scope).await? {
        return Ok(false);
    }
    let scoped = Filter::project(scope);
    for table in ALL_TABLES.iter().copied().rev().filter(|t| t.name != PROJECTS.name) {
        let removed = store.delete(table, &scoped).await?;
        if removed > 0 {
            debug!(table = table.name, removed, project = %scope, "Cascaded project delete");
        }
    }
    Ok(store.delete(&PROJECTS, &key(scope)).await? > 0)
}
