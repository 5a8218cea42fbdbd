use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, OriginalUri, Query, State, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode, Uri, header},
};
use url::Url;

use crate::{
    AppState,
    entities::movie,
    error::{AppError, AppResult},
    import,
    models::{ImportReport, Page},
    query::{self, ListParams, MovieFilter, PageRequest},
};

pub async fn upload_movies(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<ImportReport>)> {
    let Ok(mut multipart) = multipart else {
        return Err(AppError::bad_request(import::MISSING_FILE));
    };

    let bytes = import::read_csv_upload(&mut multipart, state.config.max_upload_bytes).await?;
    let report = import::import_csv(&state.db, bytes).await?;

    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Page<movie::Model>>> {
    let filter = MovieFilter::from_params(&params)?;
    let req = PageRequest::from_params(&params)?;
    let slice = query::fetch_page(&state.db, &filter, req).await?;

    let fallback_host = state.config.addr.to_string();
    let request_url = request_url(&headers, &fallback_host, &uri)?;

    Ok(Json(Page {
        count: slice.count,
        next: slice.has_next().then(|| page_link(&request_url, slice.number + 1)),
        previous: slice.has_previous().then(|| page_link(&request_url, slice.number - 1)),
        results: slice.items,
    }))
}

/// Absolute URL of the current request, from `Host` and `X-Forwarded-Proto`.
fn request_url(headers: &HeaderMap, fallback_host: &str, uri: &Uri) -> AppResult<Url> {
    let header_str = |name| headers.get(name).and_then(|v| v.to_str().ok());

    let host = header_str(header::HOST).unwrap_or(fallback_host);
    let scheme =
        header_str(header::HeaderName::from_static("x-forwarded-proto")).unwrap_or("http");
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

    Url::parse(&format!("{scheme}://{host}{path_and_query}"))
        .map_err(|_| AppError::bad_request("Invalid Host header."))
}

/// Same query with `page` replaced; the link to the first page carries no `page`.
fn page_link(request_url: &Url, page: u64) -> String {
    let mut url = request_url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| *key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if pairs.is_empty() && page <= 1 {
        url.set_query(None);
    } else {
        let mut query = url.query_pairs_mut();
        query.clear().extend_pairs(&pairs);
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
    }

    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn page_link_replaces_page() {
        let current = url("http://testserver/movies/?language=en&page=2&page_size=5");
        assert_eq!(
            page_link(&current, 3),
            "http://testserver/movies/?language=en&page_size=5&page=3"
        );
        assert_eq!(page_link(&current, 1), "http://testserver/movies/?language=en&page_size=5");

        assert_eq!(page_link(&url("http://testserver/movies/?page=2"), 1), "http://testserver/movies/");
        assert_eq!(page_link(&url("http://testserver/movies/"), 2), "http://testserver/movies/?page=2");
    }

    #[test]
    fn page_link_matches_encoded_page_key() {
        let current = url("http://testserver/movies/?p%61ge=4&language=pt%2DBR");
        assert_eq!(page_link(&current, 5), "http://testserver/movies/?language=pt-BR&page=5");
    }

    #[test]
    fn request_url_uses_host_and_forwarded_proto() {
        let uri: Uri = "/movies/?page=2".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(
            request_url(&headers, "127.0.0.1:8000", &uri).unwrap().as_str(),
            "http://127.0.0.1:8000/movies/?page=2"
        );

        headers.insert(header::HOST, "example.com".parse().unwrap());
        assert_eq!(
            request_url(&headers, "127.0.0.1:8000", &uri).unwrap().as_str(),
            "http://example.com/movies/?page=2"
        );

        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        assert_eq!(
            request_url(&headers, "127.0.0.1:8000", &uri).unwrap().as_str(),
            "https://example.com/movies/?page=2"
        );

        headers.insert(header::HOST, "bad host".parse().unwrap());
        assert!(request_url(&headers, "127.0.0.1:8000", &uri).is_err());
    }
}
