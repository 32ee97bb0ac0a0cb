//! Storefront page authorization gateway.
//!
//! Every page request passes through `middleware::auth::gateway` before it is
//! rendered. Protected areas (`/mypage`, `/checkout`) require a session the
//! backend confirms via `GET /auth/status`; auth pages (`/login`, `/register`)
//! bounce visitors who are already signed in. Everything else is public.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
