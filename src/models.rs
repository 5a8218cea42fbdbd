use jiff::civil::Date;
use sea_orm::{NotSet, Set};
use serde::Serialize;

use crate::entities::movie;

/// A CSV row that passed validation, normalized and ready for storage.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub original_title: String,
    pub overview: String,
    pub release_date: Date,
    pub revenue: f64,
    pub budget: f64,
    pub runtime: i32,
    pub status: String,
    pub vote_average: f64,
    pub vote_count: i32,
    pub original_language: String,
    pub production_company_id: i32,
    pub genre_id: i32,
    pub languages: String,
    pub homepage: String,
}

impl From<NewMovie> for movie::ActiveModel {
    fn from(m: NewMovie) -> Self {
        Self {
            id: NotSet,
            title: Set(m.title),
            original_title: Set(m.original_title),
            overview: Set(m.overview),
            release_date: Set(m.release_date.to_string()),
            revenue: Set(m.revenue),
            budget: Set(m.budget),
            runtime: Set(m.runtime),
            status: Set(m.status),
            vote_average: Set(m.vote_average),
            vote_count: Set(m.vote_count),
            original_language: Set(m.original_language),
            production_company_id: Set(m.production_company_id),
            genre_id: Set(m.genre_id),
            languages: Set(m.languages),
            homepage: Set(m.homepage),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ImportReport {
    pub status: &'static str,
    pub movies_created: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn success(movies_created: usize, errors: Vec<String>) -> Self {
        Self { status: "success", movies_created, errors }
    }
}

/// Page envelope returned by list endpoints.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}
