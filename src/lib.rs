//! # Akira
//!
//! A small HTTP service that turns one uploaded image into many sizes.
//! A client posts an image plus a `;`-separated size list such as
//! `64x64;128x128;;512x512`; the service answers with one base64 data URI
//! per non-blank size, each re-encoded at the requested quality.
//!
//! # Architecture: Validate, Fan Out, Collect
//!
//! ```text
//! POST /resize ─► request::validate ─► dispatch::Dispatcher ─► api::ImagesResponse
//!                  (400 / 500)          N tokens → N transforms    (blanks, failures dropped)
//! ```
//!
//! Request-level problems (missing `size`, bad `quality`, unreadable upload)
//! are answered before any image work starts. Everything after that is
//! per-size: a size that fails to parse, decode or encode only loses its own
//! entry, never its siblings.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sizes`] | Size list parsing: `;`-split into tokens, `WxH` per token |
//! | [`imaging`] | Engine trait, `image`-crate engine, downscale/enlarge decision, per-size transform |
//! | [`dispatch`] | Process-wide bounded worker pool, per-request queues, barrier read |
//! | [`cancel`] | Cancellation/deadline token shared by a request's jobs |
//! | [`request`] | Boundary validation of the multipart form |
//! | [`api`] | JSON response envelopes and HTTP error mapping |
//! | [`server`] | axum router, logging middleware, graceful shutdown |
//! | [`config`] | `akira.toml` loading, merging, and validation |
//! | [`output`] | CLI report for one-shot resizes |
//!
//! # Design Decisions
//!
//! ## One Pool for the Whole Process
//!
//! Every request shares a single worker pool of `processing.pool_size`
//! threads. Two concurrent requests with ten sizes each still run at most
//! `pool_size` transforms at once; the second request's jobs wait for free
//! workers instead of multiplying threads.
//!
//! ## Downscale or Enlarge
//!
//! A size is produced by downscaling when the source is at least as large as
//! the target on *either* axis, and by enlarging otherwise. Both paths resample
//! to the exact target box; aspect ratio is not preserved. See
//! [`imaging::choose_resample`].
//!
//! ## Quiet Partial Failure
//!
//! By default a size that fails is left out of the response and `error`
//! stays `false`, so the response shape never changes. Setting
//! `resize.report_failures` adds a `failed` list and flips `error` instead.

pub mod api;
pub mod cancel;
pub mod config;
pub mod dispatch;
pub mod imaging;
pub mod output;
pub mod request;
pub mod server;
pub mod sizes;

#[cfg(test)]
pub(crate) mod test_helpers;
