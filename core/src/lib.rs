//! Client core for the project backend and its GitLab-compatible API.
//!
//! # Overview
//! Builds `HttpRequest` values, attaches per-service headers, and parses
//! `HttpResponse` values into JSON or typed projects without touching the
//! network (host-does-IO pattern). `ProjectApi` chains the steps through a
//! `Transport` for callers that want one call per operation.
//!
//! # Design
//! - `ProjectApiClient` is stateless: two origins plus a `HeaderProvider`.
//! - Each operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit and every step is testable on plain data.
//! - Listings are normalized to camelCase projects with `backendId` and a
//!   caller-chosen `projectType`; see `normalize`.
//! - The `ureq` feature (default) provides a blocking `UreqTransport`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod normalize;
pub mod transport;
pub mod types;

pub use api::ProjectApi;
pub use client::ProjectApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use headers::{HeaderProvider, ServiceTarget, SessionHeaders};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use transport::DEFAULT_MAX_BODY_BYTES;
pub use types::{CodeProject, DataProject, Experiment, ForkRequest, Page, Project, ProjectType, ResourceId};
