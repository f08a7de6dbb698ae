use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, PostDto};
use crate::db::PostInput;

#[derive(Deserialize)]
pub struct PostRequest {
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    #[serde(default)]
    pub published: bool,
}

impl PostRequest {
    fn validate(&self) -> Result<PostInput, ApiError> {
        if self.slug.is_empty() {
            return Err(ApiError::validation("Slug is required"));
        }
        if !self
            .slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ApiError::validation(
                "Slug may only contain letters, digits and hyphens",
            ));
        }
        if self.title.is_empty() {
            return Err(ApiError::validation("Title is required"));
        }

        Ok(PostInput {
            slug: self.slug.clone(),
            title: self.title.clone(),
            summary: self.summary.clone(),
            body: self.body.clone(),
            published: self.published,
        })
    }
}

/// GET /posts
/// Published posts, newest first
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let posts = state.store.list_published_posts().await?;

    Ok(Json(ApiResponse::success(
        posts.into_iter().map(PostDto::from).collect(),
    )))
}

/// GET /posts/{slug}
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = state
        .store
        .get_post_by_slug(&slug)
        .await?
        .filter(|p| p.published)
        .ok_or_else(|| ApiError::not_found("Post", &slug))?;

    Ok(Json(ApiResponse::success(PostDto::from(post))))
}

/// GET /admin/posts
/// All posts including drafts (requires authentication)
pub async fn list_all_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let posts = state.store.list_all_posts().await?;

    Ok(Json(ApiResponse::success(
        posts.into_iter().map(PostDto::from).collect(),
    )))
}

/// POST /admin/posts
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PostRequest>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let input = payload.validate()?;

    if state.store.get_post_by_slug(&input.slug).await?.is_some() {
        return Err(ApiError::validation(format!(
            "A post with slug '{}' already exists",
            input.slug
        )));
    }

    let post = state.store.create_post(&input).await?;

    Ok(Json(ApiResponse::success(PostDto::from(post))))
}

/// PUT /admin/posts/{id}
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<PostRequest>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let input = payload.validate()?;

    let post = state
        .store
        .update_post(id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Post", id))?;

    Ok(Json(ApiResponse::success(PostDto::from(post))))
}

/// DELETE /admin/posts/{id}
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !state.store.delete_post(id).await? {
        return Err(ApiError::not_found("Post", id));
    }

    Ok(Json(ApiResponse::success(())))
}
