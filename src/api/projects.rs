use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, ProjectDto};
use crate::db::ProjectInput;

#[derive(Deserialize)]
pub struct ProjectRequest {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub repo_url: Option<String>,
    pub live_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sort_order: i32,
}

impl ProjectRequest {
    fn validate(&self) -> Result<ProjectInput, ApiError> {
        if self.slug.is_empty() {
            return Err(ApiError::validation("Slug is required"));
        }
        if self.name.is_empty() {
            return Err(ApiError::validation("Name is required"));
        }

        Ok(ProjectInput {
            slug: self.slug.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            repo_url: self.repo_url.clone(),
            live_url: self.live_url.clone(),
            featured: self.featured,
            sort_order: self.sort_order,
        })
    }
}

/// GET /projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ProjectDto>>>, ApiError> {
    let projects = state.store.list_projects().await?;

    Ok(Json(ApiResponse::success(
        projects.into_iter().map(ProjectDto::from).collect(),
    )))
}

/// POST /admin/projects
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProjectRequest>,
) -> Result<Json<ApiResponse<ProjectDto>>, ApiError> {
    let input = payload.validate()?;
    let project = state.store.create_project(&input).await?;

    Ok(Json(ApiResponse::success(ProjectDto::from(project))))
}

/// PUT /admin/projects/{id}
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ProjectRequest>,
) -> Result<Json<ApiResponse<ProjectDto>>, ApiError> {
    let input = payload.validate()?;

    let project = state
        .store
        .update_project(id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Project", id))?;

    Ok(Json(ApiResponse::success(ProjectDto::from(project))))
}

/// DELETE /admin/projects/{id}
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !state.store.delete_project(id).await? {
        return Err(ApiError::not_found("Project", id));
    }

    Ok(Json(ApiResponse::success(())))
}
