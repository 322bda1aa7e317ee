// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the single-shot commands.
//
// Module responsibilities:
// - `api`: Encapsulates HTTP interactions with the trickle service
//   (login, topics, activities) and the typed errors they surface.
// - `session`: Persists the `{me, access_token}` bundle written on login
//   and restored on every later invocation.
// - `ui`: Implements the command handlers and output formatting, and
//   delegates requests to `api`.
//
// Keeping this separation makes it easier to test the API logic against
// a mock server and the formatting without any network at all.
pub mod api;
pub mod session;
pub mod ui;
