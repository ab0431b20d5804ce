use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use newsdesk_core::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

/// Renders field errors as `field: reason`, ordered by field name.
fn format_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let mut parts = Vec::new();
    for (field, field_errors) in fields {
        for error in field_errors {
            let reason = error.message.as_deref().unwrap_or(&*error.code);
            parts.push(format!("{field}: {reason}"));
        }
    }
    parts.join("; ")
}

/// Pulls the field name out of serde's "missing field `name`" message.
fn missing_field(body_text: &str) -> Option<&str> {
    let (_, rest) = body_text.split_once("missing field `")?;
    rest.split_once('`').map(|(field, _)| field)
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected 'Content-Type: application/json'".to_string()
        }
        JsonRejection::JsonDataError(_) => match missing_field(&rejection.body_text()) {
            Some(field) => format!("{field} is required"),
            None => "Request body has a field of the wrong type".to_string(),
        },
        JsonRejection::JsonSyntaxError(_) => "Malformed JSON body".to_string(),
        _ => "Invalid request body".to_string(),
    };
    AppError::bad_request(anyhow!(message))
}

/// JSON body extractor that also runs `validator` rules.
///
/// Malformed JSON is a 400, failed validation a 422; both carry
/// `VALIDATION_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        if let Err(errors) = value.validate() {
            return Err(AppError::unprocessable(anyhow!(format_errors(&errors))));
        }

        Ok(ValidatedJson(value))
    }
}
