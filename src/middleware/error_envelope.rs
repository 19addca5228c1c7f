use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::{Error, HttpResponse};
use futures::future::{ok, Ready};
use futures::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::response::ErrorResponse;

fn is_json(res: &HttpResponse<impl MessageBody>) -> bool {
    res.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

/// Rebuilds an error response as a JSON `{error, code}` body, keeping the
/// original status and any headers other than the body framing.
fn into_envelope(res: HttpResponse<impl MessageBody>, fallback: Option<String>) -> HttpResponse {
    let status = res.status();
    let message = res
        .error()
        .map(|e| e.to_string())
        .or(fallback)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string());

    let mut builder = HttpResponse::build(status);
    for (name, value) in res.headers() {
        if *name != CONTENT_TYPE && *name != CONTENT_LENGTH {
            builder.append_header((name.clone(), value.clone()));
        }
    }
    builder.json(ErrorResponse::new(message, status))
}

fn needs_envelope(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

/// Guarantees every 4xx/5xx leaving the app carries the JSON error envelope.
pub struct JsonErrorsMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JsonErrorsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let http_req = req.request().clone();

        Box::pin(async move {
            match service.call(req).await {
                Ok(res) => {
                    if !needs_envelope(res.status()) || is_json(res.response()) {
                        return Ok(res.map_into_boxed_body());
                    }
                    let (http_req, response) = res.into_parts();
                    Ok(ServiceResponse::new(http_req, into_envelope(response, None)))
                }
                Err(err) => {
                    let response = err.error_response();
                    if is_json(&response) {
                        return Ok(ServiceResponse::new(http_req, response));
                    }
                    let message = err.to_string();
                    Ok(ServiceResponse::new(http_req, into_envelope(response, Some(message))))
                }
            }
        })
    }
}

pub struct JsonErrors;

impl<S, B> Transform<S, ServiceRequest> for JsonErrors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = JsonErrorsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JsonErrorsMiddleware {
            service: Rc::new(service),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::header::ALLOW;

    #[actix_web::test]
    async fn wraps_plain_error_and_keeps_headers() {
        let plain = HttpResponse::MethodNotAllowed()
            .insert_header((ALLOW, "GET"))
            .insert_header((CONTENT_TYPE, "text/plain"))
            .body("nope");

        let wrapped = into_envelope(plain, None);
        assert_eq!(wrapped.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(wrapped.headers().get(ALLOW).unwrap(), "GET");
        assert!(is_json(&wrapped));

        let body = to_bytes(wrapped.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Method Not Allowed");
        assert_eq!(json["code"], 405);
    }

    #[test]
    fn only_error_statuses_are_enveloped() {
        assert!(!needs_envelope(StatusCode::OK));
        assert!(!needs_envelope(StatusCode::NO_CONTENT));
        assert!(needs_envelope(StatusCode::NOT_FOUND));
        assert!(needs_envelope(StatusCode::BAD_GATEWAY));
    }
}
