use std::sync::Arc;

use axum::{
    extract::{Form, State},
    response::Html,
};

use crate::{
    AppState, error::AppResult, models::Filter, repository::ScreeningRepo, templates,
};

pub async fn index(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let options = state.repo.filter_options().await?;
    let screenings = state.repo.query_with_filter(&Filter::default()).await?;
    Ok(Html(templates::index_page(&options, &screenings)))
}

pub async fn selects(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let options = state.repo.filter_options().await?;
    Ok(Html(templates::selects_fragment(&options)))
}

pub async fn screenings(
    State(state): State<Arc<AppState>>,
    Form(filter): Form<Filter>,
) -> AppResult<Html<String>> {
    let screenings = state.repo.query_with_filter(&filter).await?;
    Ok(Html(templates::screenings_fragment(&screenings)))
}
