//! Request middleware. Request spans and access logs come from
//! `tracing_actix_web::TracingLogger`, wired up in `main`.

pub mod metrics;

pub use metrics::MetricsMiddleware;
