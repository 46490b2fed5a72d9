//! REST API for the cube store.
//!
//! Provides the CRUD endpoints for cube records and the layout endpoints the
//! pallet viewer renders from. Uses Axum as the web framework and supports CORS.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::config::{ApiConfig, LayoutSettings};
use crate::layout::{
    LayoutConfig, LayoutDiagnostics, LayoutError, LayoutReport, LayoutStrategy, OverlapPair,
    PlacedCube, RejectedCube, layout_report,
};
use crate::model::{Cube, CubeDraft, CubeId, Pallet, PalletPreset, ValidationError};
use crate::store::{CubeStore, StoreError};
use crate::types::{Footprint, Vec3};

/// Shared handler state: the record store and the layout defaults.
#[derive(Clone)]
pub struct ApiState {
    store: Arc<dyn CubeStore>,
    settings: LayoutSettings,
}

impl ApiState {
    pub fn new(store: Arc<dyn CubeStore>, settings: LayoutSettings) -> Self {
        Self { store, settings }
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>cube-store API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Embedded pallet viewer (HTML, JS)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// Query parameters for `GET /layout`.
///
/// `preset` wins over `width`/`length`. A missing side falls back to the
/// configured default pallet.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LayoutQuery {
    /// Preset name (`standard`, `large`, `small`) or `WxL`
    pub preset: Option<String>,
    pub width: Option<f64>,
    pub length: Option<f64>,
    pub strategy: Option<LayoutStrategy>,
}

impl LayoutQuery {
    fn resolve_pallet(&self, default: Pallet) -> Result<Pallet, ValidationError> {
        match &self.preset {
            Some(preset) => preset.parse(),
            None => Pallet::new(
                self.width.unwrap_or(default.width),
                self.length.unwrap_or(default.length),
            ),
        }
    }
}

/// Request body for `POST /layout`: lays out cubes that are not in the store.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "pallet": { "width": 10.0, "length": 10.0 },
        "cubes": [
            { "id": 1, "caseName": "A", "width": 1.0, "height": 1.0, "length": 1.0, "mass": 2.0 }
        ],
        "strategy": "grid"
    })
)]
pub struct LayoutRequest {
    #[serde(default)]
    #[schema(nullable = true)]
    pub pallet: Option<Pallet>,
    pub cubes: Vec<Cube>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub strategy: Option<LayoutStrategy>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub gap: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct ClearResponse {
    pub message: String,
    pub removed: usize,
}

#[derive(Serialize, ToSchema)]
pub struct PalletPresetInfo {
    pub name: String,
    pub width: f64,
    pub length: f64,
}

impl From<PalletPreset> for PalletPresetInfo {
    fn from(preset: PalletPreset) -> Self {
        let pallet = preset.pallet();
        Self {
            name: preset.name().to_string(),
            width: pallet.width,
            length: pallet.length,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn store_error(err: StoreError) -> Response {
    match err {
        StoreError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "Not found", err.to_string()),
    }
}

fn layout_error(err: LayoutError) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid layout input",
        err.to_string(),
    )
}

fn parse_draft(payload: Result<Json<CubeDraft>, JsonRejection>) -> Result<CubeDraft, Response> {
    let Json(draft) = payload.map_err(json_deserialize_error)?;
    draft
        .validate()
        .map_err(|err| validation_error(err.to_string()))?;
    Ok(draft)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_cubes,
        clear_cubes,
        get_cube,
        create_cube,
        update_cube,
        delete_cube,
        list_pallets,
        get_layout,
        post_layout
    ),
    components(
        schemas(
            Cube,
            CubeDraft,
            Pallet,
            PalletPresetInfo,
            ClearResponse,
            ErrorResponse,
            LayoutRequest,
            LayoutReport,
            LayoutStrategy,
            LayoutDiagnostics,
            OverlapPair,
            PlacedCube,
            RejectedCube,
            Footprint,
            Vec3
        )
    ),
    tags(
        (name = "cubes", description = "Cube record management"),
        (name = "layout", description = "Pallet layout computation")
    )
)]
struct ApiDoc;

/// Builds the application router with all endpoints.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        // Cube records
        .route("/cubes", get(list_cubes).delete(clear_cubes))
        .route("/cube", post(create_cube))
        .route(
            "/cube/{id}",
            get(get_cube).put(update_cube).delete(delete_cube),
        )
        // Layout
        .route("/pallets", get(list_pallets))
        .route("/layout", get(get_layout).post(post_layout))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Pallet viewer (embedded)
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_static))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(
    config: ApiConfig,
    settings: LayoutSettings,
    store: Arc<dyn CubeStore>,
) -> std::io::Result<()> {
    let app = router(ApiState::new(store, settings));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|err| {
        error!("❌ Could not bind API server to {}: {}", addr, err);
        err
    })?;

    let display_host = config.display_host().to_string();
    info!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📦 API Endpoints: /cubes, /cube/{{id}}, /pallets, /layout");
    info!("📑 Documentation: /docs, /docs/openapi.json");

    axum::serve(listener, app).await.inspect_err(|err| {
        error!("❌ API server terminated with an error: {err}");
    })
}

/// Handler for GET /cubes.
#[utoipa::path(
    get,
    path = "/cubes",
    responses((status = 200, description = "All cubes in creation order", body = [Cube])),
    tag = "cubes"
)]
async fn list_cubes(State(state): State<ApiState>) -> Json<Vec<Cube>> {
    Json(state.store.list())
}

/// Handler for DELETE /cubes.
#[utoipa::path(
    delete,
    path = "/cubes",
    responses((status = 200, description = "All cubes removed", body = ClearResponse)),
    tag = "cubes"
)]
async fn clear_cubes(State(state): State<ApiState>) -> Json<ClearResponse> {
    let removed = state.store.clear_all();
    info!("🗑️ Removed all {} cubes", removed);
    Json(ClearResponse {
        message: "All cubes deleted successfully".to_string(),
        removed,
    })
}

/// Handler for GET /cube/{id}.
#[utoipa::path(
    get,
    path = "/cube/{id}",
    params(("id" = u64, Path, description = "Cube identifier")),
    responses(
        (status = 200, description = "The cube", body = Cube),
        (status = NOT_FOUND, description = "Unknown identifier", body = ErrorResponse)
    ),
    tag = "cubes"
)]
async fn get_cube(State(state): State<ApiState>, Path(id): Path<CubeId>) -> Response {
    match state.store.get(id) {
        Ok(cube) => Json(cube).into_response(),
        Err(err) => store_error(err),
    }
}

/// Handler for POST /cube.
///
/// Answers 201 with the created cube and its location.
#[utoipa::path(
    post,
    path = "/cube",
    request_body = CubeDraft,
    responses(
        (status = CREATED, description = "Cube created", body = Cube),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid cube data", body = ErrorResponse)
    ),
    tag = "cubes"
)]
async fn create_cube(
    State(state): State<ApiState>,
    payload: Result<Json<CubeDraft>, JsonRejection>,
) -> Response {
    let draft = match parse_draft(payload) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    let cube = state.store.create(draft);
    info!("📥 Created cube {} ('{}')", cube.id, cube.case_name);
    let location = format!("/cube/{}", cube.id);
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(cube),
    )
        .into_response()
}

/// Handler for PUT /cube/{id}.
#[utoipa::path(
    put,
    path = "/cube/{id}",
    params(("id" = u64, Path, description = "Cube identifier")),
    request_body = CubeDraft,
    responses(
        (status = 200, description = "Cube updated", body = Cube),
        (status = NOT_FOUND, description = "Unknown identifier", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid cube data", body = ErrorResponse)
    ),
    tag = "cubes"
)]
async fn update_cube(
    State(state): State<ApiState>,
    Path(id): Path<CubeId>,
    payload: Result<Json<CubeDraft>, JsonRejection>,
) -> Response {
    let draft = match parse_draft(payload) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match state.store.update(id, draft) {
        Ok(cube) => Json(cube).into_response(),
        Err(err) => store_error(err),
    }
}

/// Handler for DELETE /cube/{id}.
#[utoipa::path(
    delete,
    path = "/cube/{id}",
    params(("id" = u64, Path, description = "Cube identifier")),
    responses(
        (status = 200, description = "The removed cube", body = Cube),
        (status = NOT_FOUND, description = "Unknown identifier", body = ErrorResponse)
    ),
    tag = "cubes"
)]
async fn delete_cube(State(state): State<ApiState>, Path(id): Path<CubeId>) -> Response {
    match state.store.delete(id) {
        Ok(cube) => {
            info!("🗑️ Deleted cube {}", cube.id);
            Json(cube).into_response()
        }
        Err(err) => store_error(err),
    }
}

/// Handler for GET /pallets.
#[utoipa::path(
    get,
    path = "/pallets",
    responses((status = 200, description = "Available pallet presets", body = [PalletPresetInfo])),
    tag = "layout"
)]
async fn list_pallets() -> Json<Vec<PalletPresetInfo>> {
    Json(PalletPreset::ALL.into_iter().map(PalletPresetInfo::from).collect())
}

/// Handler for GET /layout.
///
/// Lays out the current store snapshot on the requested pallet.
#[utoipa::path(
    get,
    path = "/layout",
    params(LayoutQuery),
    responses(
        (status = 200, description = "Placements for all stored cubes", body = LayoutReport),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid pallet", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn get_layout(
    State(state): State<ApiState>,
    query: Result<Query<LayoutQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(err) => return validation_error(err.to_string()),
    };

    let pallet = match query.resolve_pallet(state.settings.default_pallet()) {
        Ok(pallet) => pallet,
        Err(err) => return validation_error(err.to_string()),
    };

    let mut config = state.settings.layout_config();
    if let Some(strategy) = query.strategy {
        config.strategy = strategy;
    }

    respond_with_layout(&state.store.list(), &pallet, &config)
}

/// Handler for POST /layout.
///
/// Lays out the cubes given in the body without touching the store.
#[utoipa::path(
    post,
    path = "/layout",
    request_body = LayoutRequest,
    responses(
        (status = 200, description = "Placements for the given cubes", body = LayoutReport),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn post_layout(
    State(state): State<ApiState>,
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let pallet = request
        .pallet
        .unwrap_or_else(|| state.settings.default_pallet());
    let mut config = state.settings.layout_config();
    if let Some(strategy) = request.strategy {
        config.strategy = strategy;
    }
    if let Some(gap) = request.gap {
        config.gap = gap;
    }

    respond_with_layout(&request.cubes, &pallet, &config)
}

fn respond_with_layout(cubes: &[Cube], pallet: &Pallet, config: &LayoutConfig) -> Response {
    match layout_report(cubes, pallet, config) {
        Ok(report) => {
            info!(
                "📦 Layout on {}x{} pallet: {} placed, {} rejected",
                pallet.width,
                pallet.length,
                report.placed_count(),
                report.rejected_count()
            );
            Json(report).into_response()
        }
        Err(err) => layout_error(err),
    }
}

/// Serves the index.html main page
async fn serve_index() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serves static assets (JS, CSS, etc.)
async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
