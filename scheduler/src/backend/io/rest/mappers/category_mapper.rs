use std::collections::HashMap;

use shared::CategoryView;

use crate::backend::domain::error::{ScheduleError, ScheduleResult};
use crate::backend::domain::models::category::{Category, Rgb};

/// Badge background: the category color lightened by this amount
const BACKGROUND_LIGHTEN: f64 = 0.9;
/// Badge text: the category color darkened by this amount
const TEXT_DARKEN: f64 = 0.3;

pub struct CategoryMapper;

impl CategoryMapper {
    pub fn parse_color(color: &str) -> ScheduleResult<Rgb> {
        color
            .parse::<Rgb>()
            .map_err(|e| ScheduleError::validation(e.to_string()))
    }

    pub fn to_dto(category: Category) -> shared::Category {
        category.into()
    }

    pub fn to_view(category: Category, activity_count: usize) -> CategoryView {
        CategoryView {
            activity_count,
            background_color: category.color.lighten(BACKGROUND_LIGHTEN).to_string(),
            text_color: category.color.darken(TEXT_DARKEN).to_string(),
            category: category.into(),
        }
    }

    pub fn to_view_list(categories: Vec<Category>, usage: &HashMap<String, usize>) -> Vec<CategoryView> {
        categories
            .into_iter()
            .map(|category| {
                let count = usage.get(&category.id).copied().unwrap_or(0);
                Self::to_view(category, count)
            })
            .collect()
    }
}
