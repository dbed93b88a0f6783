//! Recruitment matching backend connecting teachers and schools.
//!
//! The selection engine in [`selection`] owns the shortlist and acceptance
//! workflows. Identity records, the video catalog, and outbound notifications
//! are collaborators consumed through the traits in [`directory`], [`catalog`],
//! and [`notifications`].

pub mod auth;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod http;
pub mod notifications;
pub mod selection;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
mod test_support;
