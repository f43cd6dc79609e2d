use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderValue};
use actix_web::http::Method;
use actix_web::{Error, HttpResponse};
use std::{rc::Rc, task::{Context, Poll}};
use actix_service::{Service, Transform};
use futures::future::{ok, LocalBoxFuture, Ready};

/// Origin allow-list. An empty list (or `*`) allows any origin; the
/// response always reflects the request origin rather than a wildcard.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {

    pub fn new(allowed_origins: Vec<String>) -> CorsPolicy {
        CorsPolicy {
            allowed_origins: allowed_origins
                .into_iter()
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        let origin = origin.trim_end_matches('/');
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }
}

pub struct CorsMiddleware {
    policy: CorsPolicy,
}

impl CorsMiddleware {
    pub fn new(policy: CorsPolicy) -> CorsMiddleware {
        CorsMiddleware { policy }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorsMiddleware
where
    S: Service<ServiceRequest, Response = actix_web::dev::ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CorsMiddlewareService {
            service: Rc::new(service),
            policy: Rc::new(self.policy.clone()),
        })
    }
}

pub struct CorsMiddlewareService<S> {
    service: Rc<S>,
    policy: Rc<CorsPolicy>,
}

impl<S, B> Service<ServiceRequest> for CorsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = actix_web::dev::ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let allowed = origin
            .as_deref()
            .map(|origin| self.policy.allows(origin))
            .unwrap_or(false);

        // Preflights are answered here and never reach the route table.
        if req.method() == Method::OPTIONS {
            let mut response = HttpResponse::NoContent();
            if let (Some(origin), true) = (&origin, allowed) {
                response.insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.as_str()));
                response.insert_header((
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    "authorization, content-type",
                ));
                response.insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"));
                response.insert_header((header::VARY, "Origin"));
            }
            let response = req.into_response(response.finish()).map_into_right_body();
            return Box::pin(async move { Ok(response) });
        }

        let service_future = self.service.call(req);
        Box::pin(async move {
            let mut response = service_future.await?;
            if let (Some(origin), true) = (origin, allowed) {
                if let Ok(value) = HeaderValue::from_str(&origin) {
                    response
                        .headers_mut()
                        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                    response
                        .headers_mut()
                        .insert(header::VARY, HeaderValue::from_static("Origin"));
                }
            }
            Ok(response.map_into_left_body())
        })
    }
}
