//! Campus assistant answer service
//!
//! This library provides the job lifecycle for chatakon-agentic: submitted
//! questions are queued, answered one at a time by a reformulate, generate and
//! verify loop over LLM agents, and polled by clients until they complete.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
