use std::sync::Arc;

use serde::Deserialize;
use warp::Filter;
use warp::http::StatusCode;

use crate::game_service::GameService;
use crate::identity::{UserContext, parse_identity_header};
use game_types::{ApiResponse, CreatePostRequest, GameError, GuessRequest, Timeframe};

pub mod config;
pub mod game_service;
pub mod identity;
pub mod jobs;
pub mod platform;

#[derive(Deserialize)]
struct PostQuery {
    post_id: String,
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    timeframe: Option<Timeframe>,
    limit: Option<usize>,
}

pub fn create_routes(
    service: Arc<GameService>,
    default_leaderboard_limit: usize,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let service_filter = warp::any().map({
        let service = service.clone();
        move || service.clone()
    });

    let identity = warp::header::optional::<String>("authorization").map(parse_identity_header);

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let post_type = warp::path!("api" / "post-type")
        .and(warp::get())
        .and(warp::query::<PostQuery>())
        .and(service_filter.clone())
        .and_then(handle_post_type);

    let get_post = warp::path!("api" / "post")
        .and(warp::get())
        .and(warp::query::<PostQuery>())
        .and(identity.clone())
        .and(service_filter.clone())
        .and_then(handle_get_post);

    let create_post = warp::path!("api" / "create-post")
        .and(warp::post())
        .and(warp::body::json::<CreatePostRequest>())
        .and(identity.clone())
        .and(service_filter.clone())
        .and_then(handle_create_post);

    let guess = warp::path!("api" / "guess")
        .and(warp::post())
        .and(warp::body::json::<GuessRequest>())
        .and(identity.clone())
        .and(service_filter.clone())
        .and_then(handle_guess);

    let leaderboard = warp::path!("api" / "leaderboard")
        .and(warp::get())
        .and(warp::query::<LeaderboardQuery>())
        .and(identity)
        .and(service_filter)
        .and_then(move |query, viewer, service| {
            handle_leaderboard(query, viewer, service, default_leaderboard_limit)
        });

    // CORS configuration for the web form
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST"]);

    health
        .or(post_type)
        .or(get_post)
        .or(create_post)
        .or(guess)
        .or(leaderboard)
        .with(cors)
        .with(warp::log("two_truths_one_lie"))
}

fn success_reply<T: serde::Serialize>(data: T) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&ApiResponse::Success { data }),
        StatusCode::OK,
    )
}

fn error_reply(error: GameError) -> warp::reply::WithStatus<warp::reply::Json> {
    let (status, message) = match &error {
        GameError::Validation(_) => (StatusCode::BAD_REQUEST, error.to_string()),
        GameError::NotFound(_) => (StatusCode::NOT_FOUND, error.to_string()),
        GameError::DuplicateGuess | GameError::SelfGuess | GameError::NotAGamePost => {
            (StatusCode::CONFLICT, error.to_string())
        }
        GameError::Storage(inner) => {
            tracing::error!(error = %inner, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong, please try again later".to_string(),
            )
        }
    };
    warp::reply::with_status(
        warp::reply::json(&ApiResponse::<()>::Error { message }),
        status,
    )
}

fn unauthorized_reply() -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&ApiResponse::<()>::Error {
            message: "Authentication required".to_string(),
        }),
        StatusCode::UNAUTHORIZED,
    )
}

async fn handle_post_type(
    query: PostQuery,
    service: Arc<GameService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(match service.post_type(&query.post_id).await {
        Ok(data) => success_reply(data),
        Err(error) => error_reply(error),
    })
}

async fn handle_get_post(
    query: PostQuery,
    viewer: Option<UserContext>,
    service: Arc<GameService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(match service.get_post(viewer.as_ref(), &query.post_id).await {
        Ok(data) => success_reply(data),
        Err(error) => error_reply(error),
    })
}

async fn handle_create_post(
    request: CreatePostRequest,
    author: Option<UserContext>,
    service: Arc<GameService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let Some(author) = author else {
        return Ok(unauthorized_reply());
    };
    Ok(match service.create_game_post(&author, request).await {
        Ok(data) => success_reply(data),
        Err(error) => error_reply(error),
    })
}

async fn handle_guess(
    request: GuessRequest,
    guesser: Option<UserContext>,
    service: Arc<GameService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let Some(guesser) = guesser else {
        return Ok(unauthorized_reply());
    };
    Ok(match service.submit_guess(&guesser, request).await {
        Ok(data) => success_reply(data),
        Err(error) => error_reply(error),
    })
}

async fn handle_leaderboard(
    query: LeaderboardQuery,
    viewer: Option<UserContext>,
    service: Arc<GameService>,
    default_limit: usize,
) -> Result<impl warp::Reply, warp::Rejection> {
    let timeframe = query.timeframe.unwrap_or(Timeframe::AllTime);
    let limit = query.limit.unwrap_or(default_limit).min(100);

    Ok(
        match service.get_leaderboard(viewer.as_ref(), timeframe, limit).await {
            Ok(data) => success_reply(data),
            Err(error) => error_reply(error),
        },
    )
}
