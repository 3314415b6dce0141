use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::ml::embedding::similarities;
use crate::ml::knowledge_graph::{Properties, Relation, DEFAULT_MAX_PATHS};
use crate::ml::ner::{extract_skills, Entity};
use crate::ml::ranking::{RankedDocument, RankingModel};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub query: String,
    pub documents: Vec<String>,
    /// Fit the vocabulary on this corpus instead of the query and documents.
    #[serde(default)]
    pub corpus: Vec<String>,
}

#[derive(Serialize)]
pub struct RankResponse {
    pub results: Vec<RankedDocument>,
}

/// POST /api/v1/rank
pub async fn handle_rank(Json(req): Json<RankRequest>) -> Result<Json<RankResponse>, AppError> {
    if req.documents.is_empty() {
        return Err(AppError::Validation("documents must not be empty".to_string()));
    }

    let mut model = RankingModel::default();
    if req.corpus.is_empty() {
        let mut fit_on = Vec::with_capacity(req.documents.len() + 1);
        fit_on.push(req.query.as_str());
        fit_on.extend(req.documents.iter().map(String::as_str));
        model.fit(&fit_on);
    } else {
        model.fit(&req.corpus);
    }

    let results = model
        .rank_documents(&req.query, &req.documents)
        .map_err(|_| AppError::Validation("no rankable terms in the input".to_string()))?;
    Ok(Json(RankResponse { results }))
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub query: String,
    pub candidates: Vec<String>,
}

#[derive(Serialize)]
pub struct CandidateMatch {
    pub index: usize,
    pub text: String,
    pub similarity: f32,
}

/// POST /api/v1/match
/// Embedding similarity of each candidate to the query, best first.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<Value>, AppError> {
    if req.candidates.is_empty() {
        return Err(AppError::Validation("candidates must not be empty".to_string()));
    }

    let scores = similarities(state.embedder.as_ref(), &req.query, &req.candidates)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let mut matches: Vec<CandidateMatch> = req
        .candidates
        .into_iter()
        .zip(scores)
        .enumerate()
        .map(|(index, (text, similarity))| CandidateMatch {
            index,
            text,
            similarity,
        })
        .collect();
    matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    Ok(Json(json!({ "matches": matches })))
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct EntitiesResponse {
    pub entities: Vec<Entity>,
    pub skills: Vec<String>,
}

/// POST /api/v1/extract-entities
pub async fn handle_extract_entities(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<EntitiesResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }

    let entities = state
        .ner
        .extract_entities(&req.text)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;
    Ok(Json(EntitiesResponse {
        entities,
        skills: extract_skills(&req.text),
    }))
}

// ── Knowledge graph ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EntityRequest {
    pub id: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Deserialize)]
pub struct RelationRequest {
    pub source: String,
    pub target: String,
    pub relation: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Deserialize)]
pub struct GraphQueryRequest {
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub source: String,
    pub target: String,
    pub max_paths: Option<usize>,
}

/// POST /api/v1/graph/entities
pub async fn handle_add_entity(
    State(state): State<AppState>,
    Json(req): Json<EntityRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if req.id.trim().is_empty() {
        return Err(AppError::Validation("id must not be empty".to_string()));
    }

    let mut graph = state.graph.write().await;
    graph.add_entity(&req.id, req.properties);
    let properties = graph.entity(&req.id).cloned().unwrap_or_default();
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": req.id,
            "properties": properties,
            "entity_count": graph.entity_count(),
        })),
    ))
}

/// POST /api/v1/graph/relations
pub async fn handle_add_relation(
    State(state): State<AppState>,
    Json(req): Json<RelationRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if req.source.trim().is_empty() || req.target.trim().is_empty() {
        return Err(AppError::Validation(
            "source and target must not be empty".to_string(),
        ));
    }

    let mut graph = state.graph.write().await;
    graph.add_relation(&req.source, &req.target, &req.relation, req.properties);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "source": req.source,
            "target": req.target,
            "relation": req.relation,
            "entity_count": graph.entity_count(),
            "relation_count": graph.relation_count(),
        })),
    ))
}

/// POST /api/v1/graph/query
pub async fn handle_query_entities(
    State(state): State<AppState>,
    Json(req): Json<GraphQueryRequest>,
) -> Json<Value> {
    let entities = state.graph.read().await.query_entities(&req.properties);
    Json(json!({ "entities": entities }))
}

/// GET /api/v1/graph/entities/:id/relations
pub async fn handle_get_relations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Relation>>, AppError> {
    let relations = state
        .graph
        .read()
        .await
        .get_relations(&id)
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    Ok(Json(relations))
}

/// GET /api/v1/graph/paths?source=&target=&max_paths=
pub async fn handle_find_paths(
    State(state): State<AppState>,
    Query(params): Query<PathQuery>,
) -> Json<Value> {
    let max_paths = params.max_paths.unwrap_or(DEFAULT_MAX_PATHS);
    let paths = state
        .graph
        .read()
        .await
        .find_paths(&params.source, &params.target, max_paths);
    Json(json!({ "paths": paths }))
}
