//! Interfaces to Google Cloud.

mod auth;
mod client;
pub(crate) mod storage;

pub(crate) use client::*;
