// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for pushdeploy.
//!
//! Every outbound client is built from [`builder`] so requests carry a
//! consistent User-Agent header, which GitHub requires.

mod client;

pub use client::{builder, builder_with_timeout, user_agent};
