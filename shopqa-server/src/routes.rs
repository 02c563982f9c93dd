//! Request dispatcher: maps inbound form actions to session operations.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use shopqa_data::SnapshotStats;
use shopqa_rag::{Answer, RagError};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::session::{QaSession, SessionError};

/// Overall request budget; collaborator hangs render as a timeout
/// rather than stalling the connection forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const INIT_FAILED_MSG: &str = "Failed to initialize the catalog index. Please check the logs.";

/// Inbound form body: `action` selects the operation, `query` carries
/// the question for `action=query`.
#[derive(Debug, Deserialize)]
pub struct ActionForm {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub query: String,
}

/// Build the application router.
pub fn app_router(session: Arc<QaSession>) -> Router {
    Router::new()
        .route("/", get(index).post(dispatch))
        .route("/health", get(health))
        .with_state(session)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}

async fn health() -> &'static str {
    "ok"
}

async fn index(State(session): State<Arc<QaSession>>) -> Html<String> {
    let error = if session.ensure_initialized().await { None } else { Some(INIT_FAILED_MSG) };
    let stats = session.stats().await;
    render_page(None, None, error, stats.as_ref())
}

async fn dispatch(
    State(session): State<Arc<QaSession>>,
    Form(form): Form<ActionForm>,
) -> Html<String> {
    if !session.ensure_initialized().await && form.action != "refresh" {
        let stats = session.stats().await;
        return render_page(None, None, Some(INIT_FAILED_MSG), stats.as_ref());
    }

    let (answer, message, error) = match form.action.as_str() {
        "refresh" => {
            info!("refresh requested");
            if session.refresh().await {
                (None, Some("Successfully regenerated data and refreshed the index."), None)
            } else {
                (None, None, Some("Failed to refresh data. Please check the logs.".to_string()))
            }
        }
        // `query` is the default action.
        _ => match session.answer(&form.query).await {
            Ok(answer) => (Some(answer), None, None),
            Err(SessionError::NotInitialized) => {
                (None, None, Some("The system is not initialized. Try refreshing.".to_string()))
            }
            Err(SessionError::Rag(RagError::InvalidQuery)) => {
                (None, None, Some("Please enter a valid query.".to_string()))
            }
            Err(e) => {
                (None, None, Some(format!("An error occurred while processing your query: {e}")))
            }
        },
    };

    let stats = session.stats().await;
    render_page(answer.as_ref(), message, error.as_deref(), stats.as_ref())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn render_page(
    answer: Option<&Answer>,
    message: Option<&str>,
    error: Option<&str>,
    stats: Option<&SnapshotStats>,
) -> Html<String> {
    let mut body = String::from(
        "<!doctype html>\n<html>\n<head><title>Catalog Assistant</title></head>\n<body>\n\
         <h1>Catalog Assistant</h1>\n",
    );

    if let Some(stats) = stats {
        body.push_str(&format!(
            "<p class=\"stats\">{} products, {} reviews, {} orders &mdash; generated {}</p>\n",
            stats.total_products,
            stats.total_reviews,
            stats.total_orders,
            stats.generated_at.format("%Y-%m-%d %H:%M:%S"),
        ));
    }

    body.push_str(
        "<form method=\"post\">\n\
         <input type=\"hidden\" name=\"action\" value=\"query\">\n\
         <input type=\"text\" name=\"query\" placeholder=\"Ask about products, reviews, orders...\">\n\
         <button type=\"submit\">Ask</button>\n\
         </form>\n\
         <form method=\"post\">\n\
         <input type=\"hidden\" name=\"action\" value=\"refresh\">\n\
         <button type=\"submit\">Regenerate data</button>\n\
         </form>\n",
    );

    if let Some(message) = message {
        body.push_str(&format!("<p class=\"message\">{}</p>\n", escape(message)));
    }
    if let Some(error) = error {
        body.push_str(&format!("<p class=\"error\">{}</p>\n", escape(error)));
    }
    if let Some(answer) = answer {
        body.push_str(&format!("<div class=\"response\"><p>{}</p>\n", escape(&answer.text)));
        if !answer.provenance.is_empty() {
            body.push_str("<ul class=\"sources\">\n");
            for p in &answer.provenance {
                body.push_str(&format!("<li>{} #{}</li>\n", escape(&p.source), p.id));
            }
            body.push_str("</ul>\n");
        }
        body.push_str("</div>\n");
    }

    body.push_str("</body>\n</html>\n");
    Html(body)
}
