use serde::Serialize;

use crate::entities::{posts, projects};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDto {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<posts::Model> for PostDto {
    fn from(model: posts::Model) -> Self {
        Self {
            id: model.id,
            slug: model.slug,
            title: model.title,
            summary: model.summary,
            body: model.body,
            published: model.published,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectDto {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub repo_url: Option<String>,
    pub live_url: Option<String>,
    pub featured: bool,
    pub sort_order: i32,
}

impl From<projects::Model> for ProjectDto {
    fn from(model: projects::Model) -> Self {
        Self {
            id: model.id,
            slug: model.slug,
            name: model.name,
            description: model.description,
            repo_url: model.repo_url,
            live_url: model.live_url,
            featured: model.featured,
            sort_order: model.sort_order,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub site_title: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
