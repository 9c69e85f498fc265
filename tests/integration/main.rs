//! Integration tests for Listing-Harvester
//!
//! `crawl_tests` drive the full orchestrator over a scripted in-memory
//! listing; `html_source_tests` crawl HTML served by a wiremock server.

mod crawl_tests;
mod html_source_tests;
mod support;
