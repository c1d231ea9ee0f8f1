// ABOUTME: Shared utility modules
// ABOUTME: HTTP client construction with bounded timeouts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

/// HTTP client construction with purpose-specific timeout profiles
pub mod http_client;
