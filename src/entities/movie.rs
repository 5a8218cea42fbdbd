use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub original_title: String,
    #[sea_orm(column_type = "Text")]
    pub overview: String,
    /// ISO `YYYY-MM-DD`.
    pub release_date: String,
    pub revenue: f64,
    pub budget: f64,
    pub runtime: i32,
    pub status: String,
    pub vote_average: f64,
    pub vote_count: i32,
    pub original_language: String,
    pub production_company_id: i32,
    pub genre_id: i32,
    #[sea_orm(column_type = "Text")]
    pub languages: String,
    pub homepage: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
