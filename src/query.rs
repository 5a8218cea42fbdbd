use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
    sea_query::{Expr, Func, LikeExpr},
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    entities::movie,
    error::{AppError, AppResult},
};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

pub const INVALID_PAGE: &str = "Invalid page.";

const LIKE_ESCAPE: char = '!';

/// Raw query string of `GET /movies/`. Values stay strings so bad input can be reported
/// (or ignored) per parameter instead of rejecting the whole request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListParams {
    pub year_of_release: Option<String>,
    pub language: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortKey {
    ReleaseDate,
    ReleaseDateDesc,
    VoteAverage,
    VoteAverageDesc,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "release_date" => Some(SortKey::ReleaseDate),
            "-release_date" => Some(SortKey::ReleaseDateDesc),
            "vote_average" => Some(SortKey::VoteAverage),
            "-vote_average" => Some(SortKey::VoteAverageDesc),
            _ => None,
        }
    }

    fn column_and_order(self) -> (movie::Column, Order) {
        match self {
            SortKey::ReleaseDate => (movie::Column::ReleaseDate, Order::Asc),
            SortKey::ReleaseDateDesc => (movie::Column::ReleaseDate, Order::Desc),
            SortKey::VoteAverage => (movie::Column::VoteAverage, Order::Asc),
            SortKey::VoteAverageDesc => (movie::Column::VoteAverage, Order::Desc),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MovieFilter {
    pub year: Option<i32>,
    pub language: Option<String>,
    pub sort: Option<SortKey>,
}

impl MovieFilter {
    pub fn from_params(params: &ListParams) -> AppResult<Self> {
        let year = match non_empty(&params.year_of_release) {
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| AppError::bad_request("year_of_release must be an integer."))?,
            ),
            None => None,
        };

        Ok(Self {
            year,
            language: non_empty(&params.language).map(str::to_string),
            sort: non_empty(&params.sort_by).and_then(SortKey::parse),
        })
    }

    pub fn select(&self) -> Select<movie::Entity> {
        let mut select = movie::Entity::find();

        if let Some(year) = self.year {
            select = select.filter(
                movie::Column::ReleaseDate
                    .between(format!("{year:04}-01-01"), format!("{year:04}-12-31")),
            );
        }

        if let Some(language) = &self.language {
            let pattern = format!("%{}%", escape_like(&language.to_ascii_lowercase()));
            select = select.filter(
                Condition::any()
                    .add(lower_like(movie::Column::OriginalLanguage, &pattern))
                    .add(lower_like(movie::Column::Languages, &pattern)),
            );
        }

        if let Some(sort) = self.sort {
            let (column, order) = sort.column_and_order();
            select = select.order_by(column, order);
        }

        select.order_by_asc(movie::Column::Id)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageNumber {
    Number(u64),
    Last,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRequest {
    pub page: PageNumber,
    pub size: u64,
}

impl PageRequest {
    pub fn from_params(params: &ListParams) -> AppResult<Self> {
        let page = match non_empty(&params.page) {
            None => PageNumber::Number(1),
            Some("last") => PageNumber::Last,
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n >= 1 => PageNumber::Number(n),
                _ => return Err(AppError::NotFound(INVALID_PAGE.to_string())),
            },
        };

        let size = non_empty(&params.page_size)
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .map_or(DEFAULT_PAGE_SIZE, |n| n.min(MAX_PAGE_SIZE));

        Ok(Self { page, size })
    }
}

#[derive(Clone, Debug)]
pub struct PageSlice {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub items: Vec<movie::Model>,
}

impl PageSlice {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

pub async fn fetch_page(
    db: &DatabaseConnection,
    filter: &MovieFilter,
    req: PageRequest,
) -> AppResult<PageSlice> {
    let paginator = filter.select().paginate(db, req.size);
    let totals = paginator.num_items_and_pages().await?;

    // An empty result set still has one (empty) first page.
    let num_pages = totals.number_of_pages.max(1);
    let number = match req.page {
        PageNumber::Last => num_pages,
        PageNumber::Number(n) if n <= num_pages => n,
        PageNumber::Number(_) => return Err(AppError::NotFound(INVALID_PAGE.to_string())),
    };

    let items = paginator.fetch_page(number - 1).await?;
    debug!(?filter, page = number, count = totals.number_of_items, "listed movies");

    Ok(PageSlice { number, num_pages, count: totals.number_of_items, items })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn lower_like(column: movie::Column, pattern: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col((movie::Entity, column))))
        .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}
