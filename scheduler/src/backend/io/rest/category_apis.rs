//! Category management and the active category filter.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get},
    Router,
};
use log::info;
use shared::{
    CategoryListResponse, CategoryResponse, CreateCategoryRequest, DeleteCategoryResponse, FilterResponse,
    UpdateFilterRequest,
};

use super::mappers::CategoryMapper;
use crate::backend::domain::CategoryFilter;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", delete(delete_category))
        .route("/filter", get(get_filter).put(set_filter))
}

async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/categories");

    let result = state
        .activity_store
        .categories()
        .and_then(|categories| Ok((categories, state.activity_store.category_usage()?)));

    match result {
        Ok((categories, usage)) => {
            let response = CategoryListResponse {
                categories: CategoryMapper::to_view_list(categories, &usage),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    info!("POST /api/categories - request: {:?}", request);

    let result = CategoryMapper::parse_color(&request.color)
        .and_then(|color| state.activity_store.add_category(&request.name, color));

    match result {
        Ok(category) => {
            let response = CategoryResponse {
                success_message: format!("Category '{}' added", category.name),
                category: CategoryMapper::to_dto(category),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn delete_category(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/categories/{}", id);

    match state.activity_store.remove_category(&id) {
        Ok(removal) => {
            let response = DeleteCategoryResponse {
                deleted_activities: removal.deleted_activities,
                filter_reset: removal.filter_reset,
                success_message: format!(
                    "Deleted category '{}' and {} activities",
                    removal.category.name, removal.deleted_activities
                ),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn get_filter(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/filter");

    match state.activity_store.active_filter() {
        Ok(filter) => (StatusCode::OK, Json(FilterResponse { filter: filter.to_string() })).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn set_filter(
    State(state): State<AppState>,
    Json(request): Json<UpdateFilterRequest>,
) -> impl IntoResponse {
    info!("PUT /api/filter - request: {:?}", request);

    match state.activity_store.set_filter(CategoryFilter::parse(&request.filter)) {
        Ok(filter) => (StatusCode::OK, Json(FilterResponse { filter: filter.to_string() })).into_response(),
        Err(e) => e.into_response(),
    }
}
