//! Request extractors

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// Query string extractor reporting bad parameters as an error list
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor reporting bad segments as an error list
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// JSON body that has passed its `validator` constraints
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::BadRequest(rejection.body_text()))?;

        value.validate().map_err(|e| AppError::Validation(messages(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// One message per violated constraint, sorted for stable output
fn messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::StatusCode, response::IntoResponse};

    use super::*;
    use crate::{error::ErrorResponse, models::book::BookDto};

    async fn extract(body: &'static str) -> Result<ValidatedJson<BookDto>, AppError> {
        let req = Request::builder()
            .method("POST")
            .uri("/api/books")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        ValidatedJson::<BookDto>::from_request(req, &()).await
    }

    #[tokio::test]
    async fn empty_book_yields_three_messages() {
        let err = extract("{}").await.err().unwrap();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body.errors,
            vec!["Author is required", "Isbn is required", "Title is required"]
        );
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let err = extract("{not json").await.err().unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn valid_body_passes() {
        let ValidatedJson(dto) =
            extract(r#"{"title":"As aventuras","author":"Artur","isbn":"001"}"#)
                .await
                .unwrap();
        assert_eq!(dto.isbn.as_deref(), Some("001"));
    }
}
