//! Folio wire protocol
//!
//! JSON request/response shapes for the portfolio API, shared by
//! `folio-server` (which produces them) and `folio-client` (which consumes
//! them). Field names follow the camelCase convention of the HTTP API.

mod auth;
mod chat;
mod common;
mod contact;
mod portfolio;
mod project;

pub use auth::{
    AuthFailure, Clock, FixedClock, LoginRequest, LoginResponse, Principal, SystemClock,
    TokenClaims,
};
pub use chat::{ChatRequest, ChatResponse, ChatRole, ChatTurn};
pub use common::{DeleteResponse, ErrorBody, HealthResponse, Pagination};
pub use contact::{ContactMessage, ContactRequest, ContactResponse};
pub use portfolio::{
    Comment, CommentResponse, NewComment, NewPortfolio, Portfolio, PortfolioListing,
    PortfolioPage,
};
pub use project::{NewProject, Project, ProjectListing, ProjectPage};
