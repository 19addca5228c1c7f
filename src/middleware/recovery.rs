use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::HeaderValue;
use actix_web::http::StatusCode;
use actix_web::{Error, HttpResponse};
use futures::future::{ok, Ready};
use futures::{Future, FutureExt};
use log::error;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::rc::Rc;

use super::request_id::{request_id, REQUEST_ID_HEADER};
use crate::response::ErrorResponse;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Turns a panic anywhere below it into a 500 response and reports it.
pub struct RecoverMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RecoverMiddleware<S>
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
            let outcome = AssertUnwindSafe(async move { service.call(req).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(result) => result.map(ServiceResponse::map_into_boxed_body),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    let tagged_id = request_id(&http_req);
                    let request_id = tagged_id.clone().unwrap_or_else(|| "unknown".to_string());
                    error!(
                        "Panic recovered: {} (request_id={} method={} path={})",
                        message,
                        request_id,
                        http_req.method(),
                        http_req.path()
                    );

                    sentry::with_scope(
                        |scope| {
                            scope.set_tag("request_id", &request_id);
                            scope.set_tag("path", http_req.path());
                        },
                        || sentry::capture_message(&format!("Panic recovered: {}", message), sentry::Level::Fatal),
                    );

                    let mut response = HttpResponse::InternalServerError();
                    if let Some(value) = tagged_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
                        response.insert_header((REQUEST_ID_HEADER, value));
                    }
                    let response = response.json(ErrorResponse::new(
                        "Internal Server Error",
                        StatusCode::INTERNAL_SERVER_ERROR,
                    ));
                    Ok(ServiceResponse::new(http_req, response))
                }
            }
        })
    }
}

pub struct Recover;

impl<S, B> Transform<S, ServiceRequest> for Recover
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RecoverMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RecoverMiddleware {
            service: Rc::new(service),
        })
    }
}
