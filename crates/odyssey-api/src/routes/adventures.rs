//! Routes for the adventure generation context.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use odyssey_generation::application::command_handlers;
use odyssey_generation::domain::commands;
use odyssey_generation::domain::request::GenerationRequest;

use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /generate.
///
/// Accepts the short field names older clients send (`scenes`,
/// `encounters`, `plot_twists`, `clues`) alongside the full names.
#[derive(Debug, Deserialize)]
pub struct GenerateAdventureRequest {
    /// Name of the roleplaying ruleset.
    pub game: String,
    /// Party size.
    pub players: i64,
    /// Number of scenes in the rising action.
    #[serde(alias = "scenes")]
    pub scene_count: i64,
    /// Inclusive upper bound on encounters per scene.
    #[serde(alias = "encounters")]
    pub max_encounters_per_scene: i64,
    /// Chance, per scene, of a plot twist.
    #[serde(alias = "plot_twists")]
    pub plot_twist_percent: i64,
    /// Chance, per scene, of a clue.
    #[serde(alias = "clues")]
    pub clue_percent: i64,
    /// Description of a custom ruleset.
    #[serde(default)]
    pub homebrew_description: Option<String>,
    /// Campaign setting.
    #[serde(default)]
    pub campaign_setting: Option<String>,
    /// Party level, as a number or free text.
    #[serde(default, deserialize_with = "string_or_number")]
    pub level: Option<String>,
    /// Party experience points, as a number or free text.
    #[serde(default, deserialize_with = "string_or_number")]
    pub experience: Option<String>,
    /// Trailing instruction appended to the prompt.
    #[serde(default)]
    pub context: Option<String>,
}

impl From<GenerateAdventureRequest> for GenerationRequest {
    fn from(body: GenerateAdventureRequest) -> Self {
        Self {
            game: body.game,
            players: body.players,
            scene_count: body.scene_count,
            max_encounters_per_scene: body.max_encounters_per_scene,
            plot_twist_percent: body.plot_twist_percent,
            clue_percent: body.clue_percent,
            homebrew_description: body.homebrew_description,
            campaign_setting: body.campaign_setting,
            level: body.level,
            experience: body.experience,
            context: body.context,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(Option::<Loose>::deserialize(deserializer)?.map(|value| match value {
        Loose::Text(s) => s,
        Loose::Integer(n) => n.to_string(),
        Loose::Float(f) => f.to_string(),
    }))
}

/// POST /generate
#[instrument(skip_all, fields(game = %body.game, scenes = body.scene_count))]
async fn generate_adventure(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(body): Json<GenerateAdventureRequest>,
) -> Result<Json<Value>, ApiError> {
    let command = commands::GenerateAdventure {
        correlation_id: Uuid::new_v4(),
        request: body.into(),
    };

    info!(correlation_id = %command.correlation_id, "handling generate_adventure command");

    let cancel = state.shutdown.child_token();
    let result = command_handlers::handle_generate_adventure(
        &command,
        state.backend.as_ref(),
        &state.settings,
        &cancel,
    )
    .await?;

    info!(attempts = result.attempts, "adventure generated");

    Ok(Json(state.response_format.encode(&result.adventure)))
}

/// Returns the router for the adventures context.
pub fn router() -> Router<AppState> {
    Router::new().route("/generate", post(generate_adventure))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use odyssey_core::backend::{BackendOutput, GenerationBackend};
    use odyssey_core::wire::WireFormat;
    use odyssey_generation::application::command_handlers::GenerationSettings;
    use odyssey_test_support::{FailingBackend, ScriptedBackend, sample_adventure};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    const TOKEN: &str = "test-token";

    fn app_state_with(backend: Arc<dyn GenerationBackend>) -> AppState {
        AppState::new(
            backend,
            GenerationSettings::default(),
            WireFormat::Spaced,
            HashSet::from([TOKEN.to_owned()]),
            CancellationToken::new(),
        )
    }

    fn body() -> Value {
        serde_json::json!({
            "game": "Dungeons & Dragons 5e",
            "players": 4,
            "scenes": 3,
            "encounters": 2,
            "plot_twists": 40,
            "clues": 60,
            "level": 5
        })
    }

    fn generate_request(authorization: Option<&str>, body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/generate")
            .header("content-type", "application/json");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        builder
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    async fn json_of(response: axum::response::Response) -> Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_200_with_spaced_keys() {
        // Arrange
        let adventure = sample_adventure(3, 2);
        let output = BackendOutput::Structured(adventure.clone());
        let backend = Arc::new(ScriptedBackend::structured(vec![Ok(output)]));
        let app = router().with_state(app_state_with(backend.clone()));

        // Act
        let response = app
            .oneshot(generate_request(Some("Token test-token"), &body()))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_of(response).await;
        assert_eq!(json["Exposition"], adventure.exposition.as_str());
        assert_eq!(json["Rising Action"].as_array().unwrap().len(), 3);
        assert_eq!(json["Denoument"], adventure.denouement.as_str());
        assert!(json.get("Rising_Action").is_none());

        let prompt = &backend.prompts()[0];
        assert!(prompt.contains("The players are level 5."));
    }

    #[tokio::test]
    async fn test_generate_without_token_returns_401() {
        // Arrange
        let backend = Arc::new(FailingBackend::new());
        let app = router().with_state(app_state_with(backend.clone()));

        // Act
        let response = app.oneshot(generate_request(None, &body())).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = json_of(response).await;
        assert_eq!(json["error"], "unauthorized");
        assert_eq!(json["message"], "Authentication required.");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_with_unknown_token_returns_401() {
        let app = router().with_state(app_state_with(Arc::new(FailingBackend::new())));

        let response = app
            .oneshot(generate_request(Some("Bearer someone-else"), &body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_generate_invalid_request_returns_400_without_backend_call() {
        // Arrange
        let backend = Arc::new(FailingBackend::new());
        let app = router().with_state(app_state_with(backend.clone()));
        let mut body = body();
        body["players"] = serde_json::json!(0);

        // Act
        let response = app
            .oneshot(generate_request(Some("Token test-token"), &body))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_of(response).await;
        assert_eq!(json["error"], "invalid_request");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_returns_500_with_generic_message_after_retries() {
        // Arrange
        let backend = Arc::new(FailingBackend::new());
        let app = router().with_state(app_state_with(backend.clone()));

        // Act
        let response = app
            .oneshot(generate_request(Some("Token test-token"), &body()))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_of(response).await;
        assert_eq!(json["error"], "generation_failed");
        assert_eq!(
            json["message"],
            "Something went wrong when generating adventure"
        );
        assert!(!json.to_string().contains("503"));
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_generate_after_shutdown_returns_503() {
        // Arrange
        let backend = Arc::new(FailingBackend::new());
        let state = app_state_with(backend.clone());
        state.shutdown.cancel();
        let app = router().with_state(state);

        // Act
        let response = app
            .oneshot(generate_request(Some("Token test-token"), &body()))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_returns_422_for_missing_fields() {
        let app = router().with_state(app_state_with(Arc::new(FailingBackend::new())));

        let response = app
            .oneshot(generate_request(
                Some("Token test-token"),
                &serde_json::json!({ "game": "Pathfinder" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_level_and_experience_accept_numbers_and_strings() {
        let mut value = body();
        value["experience"] = serde_json::json!("6500");

        let request: GenerateAdventureRequest = serde_json::from_value(value).unwrap();

        assert_eq!(request.level.as_deref(), Some("5"));
        assert_eq!(request.experience.as_deref(), Some("6500"));
        assert_eq!(request.scene_count, 3);
        assert_eq!(request.clue_percent, 60);
    }
}
